//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the platform audio devices and the remote backend.

pub mod capture;
pub mod comments;
pub mod config;
pub mod identity;
pub mod playback;
pub mod storage;

// Re-export adapters
pub use capture::CpalCaptureDevice;
pub use comments::SupabaseComments;
pub use config::XdgConfigStore;
pub use identity::SupabaseIdentity;
pub use playback::RodioPlaybackSink;
pub use storage::SupabaseStorage;
