//! Playback sink port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::audio::AudioArtifact;
use crate::domain::playback::PlaybackEvent;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Failed to load audio source: {0}")]
    LoadFailed(String),

    #[error("No audio output device available: {0}")]
    DeviceUnavailable(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// The audio source a player drives: a local in-memory take or a
/// persisted remote recording.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSource {
    Artifact(AudioArtifact),
    Url(String),
}

/// Port wrapping the platform playback primitive.
///
/// Commands are play/pause/seek/volume; position, duration, and
/// end-of-track arrive asynchronously on the event subscription, driven
/// by the resource's own clock rather than polled by callers.
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Load a source, replacing whatever was loaded before
    async fn load(&self, source: &PlaybackSource) -> Result<(), PlaybackError>;

    /// Begin or resume playback of the loaded source
    async fn play(&self) -> Result<(), PlaybackError>;

    /// Suspend playback, keeping the current position
    async fn pause(&self) -> Result<(), PlaybackError>;

    /// Relocate playback to an absolute position in seconds
    async fn seek_to(&self, seconds: f64) -> Result<(), PlaybackError>;

    /// Set playback volume in [0.0, 1.0]
    async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError>;

    /// Drop the loaded source and release its decoded buffers
    async fn unload(&self) -> Result<(), PlaybackError>;

    /// Subscribe to position/duration/ended events
    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent>;
}
