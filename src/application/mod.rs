//! Application layer - Use cases and port interfaces
//!
//! Contains the core recording, playback, and submission operations and
//! trait definitions for external system interactions.

pub mod player;
pub mod ports;
pub mod recorder;
pub mod submit;

// Re-export use cases
pub use player::PlayerService;
pub use recorder::{RecorderError, RecorderService};
pub use submit::{SubmitError, SubmitFeedbackUseCase, SubmitRequest};
