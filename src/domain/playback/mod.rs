//! Playback transport domain model

pub mod transport;

pub use transport::{PlaybackEvent, TrackDuration, Transport};
