//! Rodio-based playback sink adapter
//!
//! `rodio::OutputStream` is not `Send`, so one worker thread owns the
//! output device and the live sink. Commands arrive over a channel;
//! position, duration, and end-of-track are reported back on a broadcast
//! subscription driven by the worker's clock.

use std::io::Cursor;
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::sync::Mutex as StdMutex;
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::sync::{broadcast, oneshot};

use crate::application::ports::{PlaybackError, PlaybackSink, PlaybackSource};
use crate::domain::playback::PlaybackEvent;

/// How often the worker reports the playback position
const POSITION_TICK: StdDuration = StdDuration::from_millis(250);

enum Command {
    Load(Vec<u8>, oneshot::Sender<Result<(), PlaybackError>>),
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(f32),
    Unload,
}

/// Playback sink over the default system audio output
pub struct RodioPlaybackSink {
    commands: StdMutex<std_mpsc::Sender<Command>>,
    events: broadcast::Sender<PlaybackEvent>,
    client: reqwest::Client,
}

impl RodioPlaybackSink {
    /// Create a new rodio-backed playback sink
    pub fn new() -> Self {
        let (commands, command_rx) = std_mpsc::channel();
        let (events, _) = broadcast::channel(64);

        let worker_events = events.clone();
        std::thread::spawn(move || worker_loop(command_rx, worker_events));

        Self {
            commands: StdMutex::new(commands),
            events,
            client: reqwest::Client::new(),
        }
    }

    fn send(&self, command: Command) -> Result<(), PlaybackError> {
        self.commands
            .lock()
            .unwrap()
            .send(command)
            .map_err(|_| PlaybackError::PlaybackFailed("playback worker is gone".into()))
    }

    /// Resolve a remote comment URL to its bytes
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaybackError::LoadFailed(format!(
                "HTTP {} fetching audio",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Default for RodioPlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackSink for RodioPlaybackSink {
    async fn load(&self, source: &PlaybackSource) -> Result<(), PlaybackError> {
        let bytes = match source {
            PlaybackSource::Artifact(artifact) => artifact.data().to_vec(),
            PlaybackSource::Url(url) => self.fetch(url).await?,
        };

        let (done_tx, done_rx) = oneshot::channel();
        self.send(Command::Load(bytes, done_tx))?;
        done_rx
            .await
            .map_err(|_| PlaybackError::PlaybackFailed("playback worker is gone".into()))?
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        self.send(Command::Play)
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        self.send(Command::Pause)
    }

    async fn seek_to(&self, seconds: f64) -> Result<(), PlaybackError> {
        self.send(Command::SeekTo(seconds))
    }

    async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        self.send(Command::SetVolume(volume))
    }

    async fn unload(&self) -> Result<(), PlaybackError> {
        self.send(Command::Unload)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// One fully decoded track, kept in memory so the duration is known up
/// front and seeking is exact.
struct LoadedTrack {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
    duration: f64,
}

impl LoadedTrack {
    fn decode(bytes: Vec<u8>) -> Result<Self, PlaybackError> {
        let decoder =
            Decoder::new(Cursor::new(bytes)).map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        if channels == 0 || sample_rate == 0 {
            return Err(PlaybackError::LoadFailed("invalid audio stream".into()));
        }

        let samples: Vec<i16> = decoder.collect();
        let duration = samples.len() as f64 / (channels as f64 * sample_rate as f64);

        Ok(Self {
            samples,
            channels,
            sample_rate,
            duration,
        })
    }

    /// A playable source starting at the given offset
    fn source_from(&self, offset_secs: f64) -> SamplesBuffer<i16> {
        let frame = (offset_secs.max(0.0) * self.sample_rate as f64) as usize;
        let index = (frame * self.channels as usize).min(self.samples.len());
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples[index..].to_vec())
    }
}

#[derive(Default)]
struct Deck {
    output: Option<(OutputStream, OutputStreamHandle)>,
    track: Option<LoadedTrack>,
    sink: Option<Sink>,
    base_pos: f64,
    started: Option<Instant>,
    volume: f32,
}

impl Deck {
    fn new() -> Self {
        Self {
            volume: 1.0,
            ..Default::default()
        }
    }

    fn position(&self) -> f64 {
        let running = self
            .started
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.base_pos + running
    }

    fn output_handle(&mut self) -> Result<&OutputStreamHandle, PlaybackError> {
        if self.output.is_none() {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;
            self.output = Some((stream, handle));
        }
        Ok(&self.output.as_ref().unwrap().1)
    }

    /// Build a fresh sink positioned at `offset`, playing or paused
    fn rebuild_sink(&mut self, offset: f64, playing: bool) -> Result<(), PlaybackError> {
        let volume = self.volume;
        let source = match &self.track {
            Some(track) => track.source_from(offset),
            None => return Ok(()),
        };

        let handle = self.output_handle()?;
        let sink =
            Sink::try_new(handle).map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;
        sink.set_volume(volume);
        sink.append(source);
        if playing {
            sink.play();
        } else {
            sink.pause();
        }

        self.sink = Some(sink);
        self.base_pos = offset;
        self.started = playing.then(Instant::now);
        Ok(())
    }
}

fn worker_loop(commands: std_mpsc::Receiver<Command>, events: broadcast::Sender<PlaybackEvent>) {
    let mut deck = Deck::new();

    loop {
        match commands.recv_timeout(POSITION_TICK) {
            Ok(Command::Load(bytes, done)) => {
                let result = LoadedTrack::decode(bytes).and_then(|track| {
                    let duration = track.duration;
                    deck.track = Some(track);
                    deck.sink = None;
                    deck.base_pos = 0.0;
                    deck.started = None;
                    // Pre-arm a paused sink so the first play is instant and
                    // output-device problems surface at load time
                    deck.rebuild_sink(0.0, false)?;
                    let _ = events.send(PlaybackEvent::Duration(duration));
                    Ok(())
                });
                let _ = done.send(result);
            }
            Ok(Command::Play) => {
                let Some(duration) = deck.track.as_ref().map(|t| t.duration) else {
                    continue;
                };
                let exhausted = deck.sink.as_ref().map_or(true, |sink| sink.empty());
                if exhausted {
                    // A track that ran to its end restarts from the top
                    let offset = if deck.base_pos >= duration {
                        0.0
                    } else {
                        deck.base_pos
                    };
                    let _ = deck.rebuild_sink(offset, true);
                } else if let Some(sink) = &deck.sink {
                    sink.play();
                    deck.started = Some(Instant::now());
                }
            }
            Ok(Command::Pause) => {
                deck.base_pos = deck.position();
                deck.started = None;
                if let Some(sink) = &deck.sink {
                    sink.pause();
                }
            }
            Ok(Command::SeekTo(seconds)) => {
                let Some(duration) = deck.track.as_ref().map(|t| t.duration) else {
                    continue;
                };
                let target = seconds.clamp(0.0, duration);
                let playing = deck.started.is_some();
                if deck.rebuild_sink(target, playing).is_ok() {
                    let _ = events.send(PlaybackEvent::Position(target));
                }
            }
            Ok(Command::SetVolume(volume)) => {
                deck.volume = volume;
                if let Some(sink) = &deck.sink {
                    sink.set_volume(volume);
                }
            }
            Ok(Command::Unload) => {
                deck.sink = None;
                deck.track = None;
                deck.base_pos = 0.0;
                deck.started = None;
            }
            Err(RecvTimeoutError::Timeout) => {
                if deck.started.is_none() {
                    continue;
                }
                let Some(duration) = deck.track.as_ref().map(|t| t.duration) else {
                    continue;
                };
                let ran_out = deck.sink.as_ref().map_or(true, |sink| sink.empty());
                if ran_out {
                    deck.base_pos = duration;
                    deck.started = None;
                    deck.sink = None;
                    let _ = events.send(PlaybackEvent::Position(duration));
                    let _ = events.send(PlaybackEvent::Ended);
                } else {
                    let _ = events.send(PlaybackEvent::Position(deck.position().min(duration)));
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
