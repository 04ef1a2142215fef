//! Playback use case

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::playback::Transport;

use super::ports::{PlaybackError, PlaybackSink, PlaybackSource};

/// Drives one audio source through a playback sink and mirrors the sink's
/// clock into live transport state.
///
/// Transport updates arrive on the sink's event subscription; the service
/// never polls the sink. All operations are silent no-ops when nothing is
/// attached, and out-of-range seek/volume inputs are clamped by the
/// transport model rather than rejected.
pub struct PlayerService<S: PlaybackSink> {
    sink: S,
    transport: Arc<StdMutex<Transport>>,
    source: StdMutex<Option<PlaybackSource>>,
    pump: StdMutex<Option<JoinHandle<()>>>,
}

impl<S: PlaybackSink> PlayerService<S> {
    /// Create a player over a playback sink
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            transport: Arc::new(StdMutex::new(Transport::new())),
            source: StdMutex::new(None),
            pump: StdMutex::new(None),
        }
    }

    /// A copy of the live transport state
    pub fn snapshot(&self) -> Transport {
        self.transport.lock().unwrap().clone()
    }

    /// Whether a source is currently attached
    pub fn is_attached(&self) -> bool {
        self.source.lock().unwrap().is_some()
    }

    /// Bind to an audio source, resetting position, duration, and the
    /// playing flag. Re-attaching the already-attached source is a no-op.
    pub async fn attach(&self, source: PlaybackSource) -> Result<(), PlaybackError> {
        if self.source.lock().unwrap().as_ref() == Some(&source) {
            return Ok(());
        }

        self.sink.load(&source).await?;
        self.transport.lock().unwrap().reset();
        *self.source.lock().unwrap() = Some(source);
        self.ensure_event_pump();
        Ok(())
    }

    /// Suspend playback if playing, otherwise begin or resume it.
    /// Silent no-op when no source is attached.
    pub async fn toggle_play_pause(&self) -> Result<(), PlaybackError> {
        if !self.is_attached() {
            return Ok(());
        }

        let playing = self.transport.lock().unwrap().is_playing();
        if playing {
            self.sink.pause().await?;
            self.transport.lock().unwrap().set_playing(false);
        } else {
            self.sink.play().await?;
            self.transport.lock().unwrap().set_playing(true);
        }
        Ok(())
    }

    /// Relocate playback to a percent of the total duration in [0, 100],
    /// clamped into range. No-op while the duration is still pending.
    pub async fn seek(&self, percent: f64) -> Result<(), PlaybackError> {
        let target = self.transport.lock().unwrap().seek_percent(percent);
        match target {
            Some(seconds) => self.sink.seek_to(seconds).await,
            None => Ok(()),
        }
    }

    /// Set volume as a percent of maximum in [0, 100], clamped into range
    pub async fn set_volume(&self, percent: f64) -> Result<(), PlaybackError> {
        let volume = self.transport.lock().unwrap().set_volume_percent(percent);
        self.sink.set_volume(volume).await
    }

    /// Drop the attached source and release the sink's decoded buffers.
    /// Required before an unsent take's memory can actually be freed.
    pub async fn detach(&self) -> Result<(), PlaybackError> {
        if self.source.lock().unwrap().take().is_none() {
            return Ok(());
        }
        self.transport.lock().unwrap().reset();
        self.sink.unload().await
    }

    fn ensure_event_pump(&self) {
        let mut pump = self.pump.lock().unwrap();
        if pump.is_some() {
            return;
        }
        let mut events = self.sink.subscribe();
        let transport = Arc::clone(&self.transport);
        *pump = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => transport.lock().unwrap().apply(event),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
}

impl<S: PlaybackSink> Drop for PlayerService<S> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.lock().unwrap().take() {
            pump.abort();
        }
    }
}
