//! Recording use case

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::audio::AudioArtifact;
use crate::domain::recording::{PhaseError, RecordingTake, TakePhase};

use super::ports::{CaptureDevice, CaptureError, CaptureHandle, OpenCapture};

/// Errors from the recorder use case
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Recording failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Invalid phase: {0}")]
    Phase(#[from] PhaseError),
}

/// Drives one capture attempt against the platform microphone.
///
/// Owns the take state machine, pumps delivered chunks into it, advances
/// the elapsed counter once per second, and force-stops the take when it
/// reaches the configured ceiling. The capture device is held exclusively
/// between `start` and the matching `stop` or `clear`.
pub struct RecorderService<D: CaptureDevice> {
    device: D,
    take: Arc<StdMutex<RecordingTake>>,
    max_take_secs: u64,
    handle: Mutex<Option<Arc<dyn CaptureHandle>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl<D: CaptureDevice> RecorderService<D> {
    /// Create a recorder over a capture device with a take ceiling in seconds
    pub fn new(device: D, max_take_secs: u64) -> Self {
        Self {
            device,
            take: Arc::new(StdMutex::new(RecordingTake::new())),
            max_take_secs,
            handle: Mutex::new(None),
            pump: Mutex::new(None),
            ticker: Mutex::new(None),
        }
    }

    /// Current take phase
    pub fn phase(&self) -> TakePhase {
        self.take.lock().unwrap().phase()
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.take.lock().unwrap().is_recording()
    }

    /// Elapsed recording time in whole seconds
    pub fn elapsed_secs(&self) -> u64 {
        self.take.lock().unwrap().elapsed_secs()
    }

    /// The finalized artifact, if the take is stopped
    pub fn artifact(&self) -> Option<AudioArtifact> {
        self.take.lock().unwrap().artifact().cloned()
    }

    /// Open the capture stream and begin accumulating chunks.
    ///
    /// Suspends until the device-permission negotiation resolves. On
    /// failure the take stays idle with the elapsed counter at zero and
    /// nothing recorded.
    pub async fn start(&self) -> Result<(), RecorderError> {
        {
            let take = self.take.lock().unwrap();
            if !take.is_idle() {
                return Err(PhaseError {
                    phase: take.phase(),
                    action: "start recording",
                }
                .into());
            }
        }

        let OpenCapture {
            content_type,
            mut chunks,
            handle,
        } = self.device.open().await?;
        let handle: Arc<dyn CaptureHandle> = Arc::from(handle);

        if let Err(err) = self.take.lock().unwrap().begin(content_type) {
            // Lost a race with another start; release the device we opened.
            let _ = handle.close().await;
            return Err(err.into());
        }
        *self.handle.lock().await = Some(Arc::clone(&handle));

        // Chunk pump: appends fragments in delivery order and finalizes the
        // take once the stream ends, whichever side closed it.
        let take = Arc::clone(&self.take);
        let pump = tokio::spawn(async move {
            while let Some(chunk) = chunks.recv().await {
                take.lock().unwrap().append_chunk(chunk);
            }
            take.lock().unwrap().finalize();
        });
        *self.pump.lock().await = Some(pump);

        // Elapsed ticker, one tick per second. Closing the handle at the
        // ceiling ends the stream and the pump finalizes as usual.
        let take = Arc::clone(&self.take);
        let ceiling = self.max_take_secs;
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(StdDuration::from_secs(1));
            interval.tick().await; // immediate first tick
            loop {
                interval.tick().await;
                let elapsed = {
                    let mut take = take.lock().unwrap();
                    if !take.is_recording() {
                        break;
                    }
                    take.tick()
                };
                if elapsed >= ceiling {
                    let _ = handle.close().await;
                    break;
                }
            }
        });
        *self.ticker.lock().await = Some(ticker);

        Ok(())
    }

    /// Halt capture and freeze the take.
    ///
    /// Resolves only after every chunk delivered before the stop has been
    /// appended and the artifact is finalized. No-op when not recording.
    pub async fn stop(&self) -> Result<(), RecorderError> {
        if !self.is_recording() {
            return Ok(());
        }

        let close_result = match self.handle.lock().await.take() {
            Some(handle) => handle.close().await,
            None => Ok(()),
        };
        if let Some(pump) = self.pump.lock().await.take() {
            let _ = pump.await;
        }
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.abort();
        }

        close_result.map_err(Into::into)
    }

    /// Release the artifact and reset to idle.
    ///
    /// Also the teardown path: when called while recording it releases the
    /// capture device without finalizing, so an unmounted recorder never
    /// leaves the device open.
    pub async fn clear(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.close().await;
        }
        if let Some(pump) = self.pump.lock().await.take() {
            let _ = pump.await;
        }
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.abort();
        }
        self.take.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioMimeType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    /// Capture device that delivers a scripted chunk sequence and keeps the
    /// stream open until the handle is closed.
    struct ScriptedDevice {
        chunks: Vec<Vec<u8>>,
        fail: bool,
        closed: Arc<AtomicBool>,
    }

    impl ScriptedDevice {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks,
                fail: false,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        fn unavailable() -> Self {
            Self {
                chunks: Vec::new(),
                fail: true,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct ScriptedHandle {
        sender: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl CaptureHandle for ScriptedHandle {
        async fn close(&self) -> Result<(), CaptureError> {
            self.sender.lock().unwrap().take();
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl CaptureDevice for ScriptedDevice {
        async fn open(&self) -> Result<OpenCapture, CaptureError> {
            if self.fail {
                return Err(CaptureError::DeviceUnavailable(
                    "microphone permission denied".into(),
                ));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            for chunk in &self.chunks {
                let _ = tx.send(chunk.clone());
            }
            Ok(OpenCapture {
                content_type: AudioMimeType::Flac,
                chunks: rx,
                handle: Box::new(ScriptedHandle {
                    sender: StdMutex::new(Some(tx)),
                    closed: Arc::clone(&self.closed),
                }),
            })
        }
    }

    #[tokio::test]
    async fn start_then_stop_freezes_delivered_chunks() {
        let recorder = RecorderService::new(
            ScriptedDevice::new(vec![vec![0u8; 10], vec![0u8; 20], vec![0u8; 15]]),
            300,
        );

        recorder.start().await.unwrap();
        assert!(recorder.is_recording());

        recorder.stop().await.unwrap();
        assert_eq!(recorder.phase(), TakePhase::Stopped);
        assert_eq!(recorder.artifact().unwrap().size_bytes(), 45);
    }

    #[tokio::test]
    async fn failed_start_leaves_recorder_idle() {
        let recorder = RecorderService::new(ScriptedDevice::unavailable(), 300);

        let err = recorder.start().await.unwrap_err();
        assert!(matches!(
            err,
            RecorderError::Capture(CaptureError::DeviceUnavailable(_))
        ));
        assert_eq!(recorder.phase(), TakePhase::Idle);
        assert_eq!(recorder.elapsed_secs(), 0);
        assert!(recorder.artifact().is_none());
    }

    #[tokio::test]
    async fn stop_when_not_recording_is_noop() {
        let recorder = RecorderService::new(ScriptedDevice::new(vec![]), 300);
        recorder.stop().await.unwrap();
        assert_eq!(recorder.phase(), TakePhase::Idle);

        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();
        let artifact = recorder.artifact().unwrap();

        // A second stop must not disturb the frozen artifact
        recorder.stop().await.unwrap();
        assert_eq!(recorder.artifact().unwrap(), artifact);
    }

    #[tokio::test]
    async fn start_while_recording_fails() {
        let recorder = RecorderService::new(ScriptedDevice::new(vec![vec![1]]), 300);
        recorder.start().await.unwrap();

        let err = recorder.start().await.unwrap_err();
        assert!(matches!(err, RecorderError::Phase(_)));

        recorder.clear().await;
    }

    #[tokio::test]
    async fn clear_while_recording_releases_the_device() {
        let device = ScriptedDevice::new(vec![vec![1, 2, 3]]);
        let closed = Arc::clone(&device.closed);
        let recorder = RecorderService::new(device, 300);

        recorder.start().await.unwrap();
        recorder.clear().await;

        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(recorder.phase(), TakePhase::Idle);
        assert_eq!(recorder.elapsed_secs(), 0);
        assert!(recorder.artifact().is_none());
    }

    #[tokio::test]
    async fn clear_after_stop_returns_to_idle() {
        let recorder = RecorderService::new(ScriptedDevice::new(vec![vec![7; 8]]), 300);
        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();
        assert!(recorder.artifact().is_some());

        recorder.clear().await;
        assert_eq!(recorder.phase(), TakePhase::Idle);
        assert!(recorder.artifact().is_none());

        // The cycle can start again
        recorder.start().await.unwrap();
        assert!(recorder.is_recording());
        recorder.clear().await;
    }

    #[tokio::test(start_paused = true)]
    async fn take_auto_stops_at_the_ceiling() {
        let recorder = RecorderService::new(ScriptedDevice::new(vec![vec![9; 5]]), 2);
        recorder.start().await.unwrap();

        tokio::time::advance(StdDuration::from_secs(3)).await;
        // Let the ticker and pump tasks run to completion
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        assert_eq!(recorder.phase(), TakePhase::Stopped);
        assert_eq!(recorder.elapsed_secs(), 2);
        assert_eq!(recorder.artifact().unwrap().size_bytes(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_counter_ticks_once_per_second() {
        let recorder = RecorderService::new(ScriptedDevice::new(vec![]), 300);
        recorder.start().await.unwrap();

        tokio::time::advance(StdDuration::from_secs(4)).await;
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        assert_eq!(recorder.elapsed_secs(), 4);
        recorder.clear().await;
    }
}
