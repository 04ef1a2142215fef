//! Recording take domain model

pub mod take;

pub use take::{PhaseError, RecordingTake, TakePhase, DEFAULT_MAX_TAKE_SECS};
