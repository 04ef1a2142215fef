//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod comments;
pub mod config;
pub mod identity;
pub mod playback;
pub mod store;

// Re-export common types
pub use capture::{CaptureDevice, CaptureError, CaptureHandle, OpenCapture};
pub use comments::{CommentError, CommentGateway};
pub use config::ConfigStore;
pub use identity::{Identity, IdentityError, UserProfile};
pub use playback::{PlaybackError, PlaybackSink, PlaybackSource};
pub use store::{ObjectStore, StoreError};
