//! Capture infrastructure adapters
//!
//! Cross-platform microphone capture via cpal, with takes encoded to
//! FLAC at close.

mod cpal;
mod flac;

pub use self::cpal::CpalCaptureDevice;
pub use flac::{encode_take, EncodeError, TARGET_SAMPLE_RATE};
