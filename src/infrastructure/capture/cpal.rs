//! Microphone capture adapter using cpal
//!
//! The cpal stream is not thread-safe, so each open capture runs on a
//! dedicated thread that owns the stream. Encoded FLAC data is flushed
//! into the chunk channel when the capture closes, mirroring recorders
//! that hand over the container in one delivery at stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::{mpsc, oneshot, Mutex};

use super::flac::{encode_take, TARGET_SAMPLE_RATE};
use crate::application::ports::{CaptureDevice, CaptureError, CaptureHandle, OpenCapture};
use crate::domain::audio::AudioMimeType;

/// Size of the encoded fragments flushed into the chunk channel
const CHUNK_BYTES: usize = 32 * 1024;

/// Capture device adapter over the default system microphone
pub struct CpalCaptureDevice;

impl CpalCaptureDevice {
    /// Create a new cpal-backed capture device
    pub fn new() -> Self {
        Self
    }

    /// Get the default input device
    fn input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device().ok_or_else(|| {
            CaptureError::DeviceUnavailable("no microphone input device found".into())
        })
    }

    /// Pick a usable input configuration, preferring mono and a rate range
    /// that includes the encoding target.
    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported = device.supported_input_configs().map_err(|e| {
            CaptureError::DeviceUnavailable(format!("failed to query input configs: {}", e))
        })?;

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for candidate in supported {
            if candidate.sample_format() != SampleFormat::I16
                && candidate.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = candidate.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && candidate.max_sample_rate().0 >= TARGET_SAMPLE_RATE;

            let better = match &best {
                None => true,
                Some(current) => {
                    let fewer_channels = candidate.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > TARGET_SAMPLE_RATE;
                    fewer_channels || better_rate
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        let range = best.ok_or_else(|| {
            CaptureError::DeviceUnavailable("no supported input configuration".into())
        })?;

        let sample_rate = if range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
        {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            range.min_sample_rate()
        };

        let sample_format = range.sample_format();
        let config = StreamConfig {
            channels: range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Average interleaved frames down to one channel
    fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels <= 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }
}

impl Default for CpalCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for CpalCaptureDevice {
    async fn open(&self) -> Result<OpenCapture, CaptureError> {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let failure = Arc::new(StdMutex::new(None));

        {
            let stop = Arc::clone(&stop);
            let failure = Arc::clone(&failure);
            std::thread::spawn(move || {
                capture_thread(chunk_tx, ready_tx, stop, failure);
                let _ = done_tx.send(());
            });
        }

        // Suspend until the device negotiation on the capture thread resolves
        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(CaptureError::DeviceUnavailable(
                    "capture thread exited before the stream started".into(),
                ))
            }
        }

        Ok(OpenCapture {
            content_type: AudioMimeType::Flac,
            chunks: chunk_rx,
            handle: Box::new(CpalCaptureHandle {
                stop,
                done: Mutex::new(Some(done_rx)),
                failure,
            }),
        })
    }
}

/// Handle for one open cpal capture
struct CpalCaptureHandle {
    stop: Arc<AtomicBool>,
    done: Mutex<Option<oneshot::Receiver<()>>>,
    failure: Arc<StdMutex<Option<CaptureError>>>,
}

#[async_trait]
impl CaptureHandle for CpalCaptureHandle {
    async fn close(&self) -> Result<(), CaptureError> {
        self.stop.store(true, Ordering::SeqCst);

        // The thread flushes the encoded take into the chunk channel and
        // drops the sender before this resolves.
        if let Some(done) = self.done.lock().await.take() {
            let _ = done.await;
        }

        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Owns the cpal stream for the lifetime of one capture.
/// Runs on its own thread because `cpal::Stream` is not `Send`.
fn capture_thread(
    chunks: mpsc::UnboundedSender<Vec<u8>>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
    stop: Arc<AtomicBool>,
    failure: Arc<StdMutex<Option<CaptureError>>>,
) {
    let setup = || -> Result<(cpal::Device, StreamConfig, SampleFormat), CaptureError> {
        let device = CpalCaptureDevice::input_device()?;
        let (config, format) = CpalCaptureDevice::input_config(&device)?;
        Ok((device, config, format))
    };

    let (device, config, format) = match setup() {
        Ok(parts) => parts,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    let samples: Arc<StdMutex<Vec<i16>>> = Arc::new(StdMutex::new(Vec::new()));
    let capturing = Arc::new(AtomicBool::new(true));

    let build_result = match format {
        SampleFormat::I16 => {
            let samples = Arc::clone(&samples);
            let capturing = Arc::clone(&capturing);
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if capturing.load(Ordering::SeqCst) {
                        let mono = CpalCaptureDevice::downmix_to_mono(data, channels);
                        if let Ok(mut buffer) = samples.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
        }
        SampleFormat::F32 => {
            let samples = Arc::clone(&samples);
            let capturing = Arc::clone(&capturing);
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if capturing.load(Ordering::SeqCst) {
                        let widened: Vec<i16> =
                            data.iter().map(|&s| (s * 32767.0) as i16).collect();
                        let mono = CpalCaptureDevice::downmix_to_mono(&widened, channels);
                        if let Ok(mut buffer) = samples.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
        }
        _ => {
            let _ = ready.send(Err(CaptureError::DeviceUnavailable(
                "unsupported sample format".into(),
            )));
            return;
        }
    };

    let stream = match build_result {
        Ok(stream) => stream,
        Err(err) => {
            let _ = ready.send(Err(CaptureError::DeviceUnavailable(err.to_string())));
            return;
        }
    };

    if let Err(err) = stream.play() {
        let _ = ready.send(Err(CaptureError::DeviceUnavailable(err.to_string())));
        return;
    }

    let _ = ready.send(Ok(()));

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    capturing.store(false, Ordering::SeqCst);
    drop(stream);

    let captured = {
        let mut buffer = samples.lock().unwrap();
        std::mem::take(&mut *buffer)
    };

    if captured.is_empty() {
        *failure.lock().unwrap() = Some(CaptureError::StreamFailed(
            "no audio data captured".into(),
        ));
        return;
    }

    match encode_take(&captured, sample_rate) {
        Ok(flac) => {
            for piece in flac.chunks(CHUNK_BYTES) {
                if chunks.send(piece.to_vec()).is_err() {
                    break;
                }
            }
        }
        Err(err) => {
            *failure.lock().unwrap() = Some(CaptureError::StreamFailed(err.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_single_channel_is_identity() {
        let mono = vec![100i16, 200, 300];
        assert_eq!(CpalCaptureDevice::downmix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let stereo = vec![100i16, 200, 300, 400];
        assert_eq!(
            CpalCaptureDevice::downmix_to_mono(&stereo, 2),
            vec![150, 350]
        );
    }
}
