//! Capture device port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::audio::AudioMimeType;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Capture stream failed: {0}")]
    StreamFailed(String),
}

/// An open capture stream.
///
/// `chunks` delivers binary fragments in capture order. After the handle's
/// `close` resolves, every pending fragment has been flushed into the
/// channel and the sender is dropped, so the receiver drains to `None`.
pub struct OpenCapture {
    /// Content type of the data the stream delivers
    pub content_type: AudioMimeType,
    /// Ordered chunk delivery channel
    pub chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Handle for stopping the capture
    pub handle: Box<dyn CaptureHandle>,
}

/// Handle for an in-progress capture
#[async_trait]
pub trait CaptureHandle: Send + Sync {
    /// Stop capturing, flush pending data, and release the device.
    /// Idempotent: closing an already-closed capture is a no-op.
    async fn close(&self) -> Result<(), CaptureError>;
}

/// Port for the platform microphone input.
/// At most one open capture may hold the device at a time.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open the capture stream. Suspends until the device-permission
    /// negotiation resolves.
    ///
    /// # Returns
    /// The open stream, or `DeviceUnavailable` when permission is denied
    /// or no capture hardware exists.
    async fn open(&self) -> Result<OpenCapture, CaptureError>;
}
