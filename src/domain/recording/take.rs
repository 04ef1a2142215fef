//! Recording take state machine

use std::fmt;
use thiserror::Error;

use crate::domain::audio::{AudioArtifact, AudioMimeType};

/// Default ceiling on a single take, in seconds (5 minutes)
pub const DEFAULT_MAX_TAKE_SECS: u64 = 300;

/// Take phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TakePhase {
    #[default]
    Idle,
    Recording,
    Stopped,
}

impl TakePhase {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an operation is attempted in the wrong phase
#[derive(Debug, Clone, Error)]
#[error("cannot {action} while {phase}")]
pub struct PhaseError {
    pub phase: TakePhase,
    pub action: &'static str,
}

/// One capture attempt.
///
/// Phase machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> STOPPED (finalize)
///   STOPPED -> IDLE (clear)
///   RECORDING -> IDLE (clear, abort path when the device is torn down)
///
/// Chunks are append-only while Recording and are frozen into one immutable
/// artifact at finalization. The artifact byte length always equals the sum
/// of the appended chunk lengths, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingTake {
    phase: TakePhase,
    elapsed_secs: u64,
    chunks: Vec<Vec<u8>>,
    content_type: AudioMimeType,
    artifact: Option<AudioArtifact>,
}

impl RecordingTake {
    /// Create a new take in the idle phase
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current phase
    pub fn phase(&self) -> TakePhase {
        self.phase
    }

    /// Check if currently idle
    pub fn is_idle(&self) -> bool {
        self.phase == TakePhase::Idle
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.phase == TakePhase::Recording
    }

    /// Check if stopped with a finalized artifact
    pub fn is_stopped(&self) -> bool {
        self.phase == TakePhase::Stopped
    }

    /// Elapsed recording time in whole seconds
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// The finalized artifact, present only in the Stopped phase
    pub fn artifact(&self) -> Option<&AudioArtifact> {
        self.artifact.as_ref()
    }

    /// Transition from IDLE to RECORDING.
    /// The content type tags the artifact that finalization will produce.
    pub fn begin(&mut self, content_type: AudioMimeType) -> Result<(), PhaseError> {
        if self.phase != TakePhase::Idle {
            return Err(PhaseError {
                phase: self.phase,
                action: "start recording",
            });
        }
        self.phase = TakePhase::Recording;
        self.elapsed_secs = 0;
        self.content_type = content_type;
        self.chunks.clear();
        self.artifact = None;
        Ok(())
    }

    /// Append one captured chunk. Chunks arriving outside the Recording
    /// phase are discarded so a late device callback cannot mutate a
    /// finalized artifact.
    pub fn append_chunk(&mut self, chunk: Vec<u8>) {
        if self.phase == TakePhase::Recording {
            self.chunks.push(chunk);
        }
    }

    /// Advance the elapsed counter by one second while recording.
    /// Returns the new elapsed value.
    pub fn tick(&mut self) -> u64 {
        if self.phase == TakePhase::Recording {
            self.elapsed_secs += 1;
        }
        self.elapsed_secs
    }

    /// Transition from RECORDING to STOPPED, freezing all delivered chunks
    /// into one immutable artifact. No-op in any other phase.
    pub fn finalize(&mut self) {
        if self.phase != TakePhase::Recording {
            return;
        }
        let chunks = std::mem::take(&mut self.chunks);
        self.artifact = Some(AudioArtifact::from_chunks(chunks, self.content_type));
        self.phase = TakePhase::Stopped;
    }

    /// Release the artifact and any accumulated chunks and return to IDLE
    /// with the elapsed counter reset. No-op when already idle.
    pub fn clear(&mut self) {
        self.phase = TakePhase::Idle;
        self.elapsed_secs = 0;
        self.chunks.clear();
        self.artifact = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_take_is_idle() {
        let take = RecordingTake::new();
        assert!(take.is_idle());
        assert_eq!(take.elapsed_secs(), 0);
        assert!(take.artifact().is_none());
    }

    #[test]
    fn begin_from_idle() {
        let mut take = RecordingTake::new();
        assert!(take.begin(AudioMimeType::Flac).is_ok());
        assert!(take.is_recording());
    }

    #[test]
    fn begin_from_recording_fails() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();

        let err = take.begin(AudioMimeType::Flac).unwrap_err();
        assert_eq!(err.phase, TakePhase::Recording);
    }

    #[test]
    fn begin_from_stopped_fails() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();
        take.finalize();

        let err = take.begin(AudioMimeType::Flac).unwrap_err();
        assert_eq!(err.phase, TakePhase::Stopped);
    }

    #[test]
    fn artifact_concatenates_chunks_in_delivery_order() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();
        take.append_chunk(vec![1, 2, 3]);
        take.append_chunk(vec![4]);
        take.append_chunk(vec![5, 6]);
        take.finalize();

        let artifact = take.artifact().unwrap();
        assert_eq!(artifact.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn artifact_length_is_sum_of_chunk_lengths() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();
        for size in [10usize, 20, 15] {
            take.append_chunk(vec![0u8; size]);
        }
        take.finalize();

        assert!(take.is_stopped());
        assert_eq!(take.artifact().unwrap().size_bytes(), 45);
    }

    #[test]
    fn chunks_outside_recording_are_discarded() {
        let mut take = RecordingTake::new();
        take.append_chunk(vec![9; 4]);
        take.begin(AudioMimeType::Flac).unwrap();
        take.append_chunk(vec![1, 2]);
        take.finalize();
        take.append_chunk(vec![9; 4]);

        assert_eq!(take.artifact().unwrap().size_bytes(), 2);
    }

    #[test]
    fn finalize_is_noop_when_not_recording() {
        let mut take = RecordingTake::new();
        take.finalize();
        assert!(take.is_idle());
        assert!(take.artifact().is_none());

        take.begin(AudioMimeType::Flac).unwrap();
        take.append_chunk(vec![1]);
        take.finalize();
        let before = take.artifact().unwrap().clone();

        // A second finalize must not replace the frozen artifact
        take.finalize();
        assert_eq!(take.artifact().unwrap(), &before);
    }

    #[test]
    fn clear_is_noop_when_idle() {
        let mut take = RecordingTake::new();
        take.clear();
        assert!(take.is_idle());
        assert_eq!(take.elapsed_secs(), 0);
    }

    #[test]
    fn clear_from_stopped_releases_artifact_and_resets_elapsed() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();
        take.tick();
        take.tick();
        take.append_chunk(vec![1, 2, 3]);
        take.finalize();
        assert_eq!(take.elapsed_secs(), 2);

        take.clear();
        assert!(take.is_idle());
        assert_eq!(take.elapsed_secs(), 0);
        assert!(take.artifact().is_none());
    }

    #[test]
    fn clear_from_recording_aborts_without_artifact() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();
        take.append_chunk(vec![1, 2, 3]);

        take.clear();
        assert!(take.is_idle());
        assert!(take.artifact().is_none());
    }

    #[test]
    fn tick_only_advances_while_recording() {
        let mut take = RecordingTake::new();
        assert_eq!(take.tick(), 0);

        take.begin(AudioMimeType::Flac).unwrap();
        assert_eq!(take.tick(), 1);
        assert_eq!(take.tick(), 2);

        take.finalize();
        assert_eq!(take.tick(), 2);
    }

    #[test]
    fn full_cycle_can_restart() {
        let mut take = RecordingTake::new();
        take.begin(AudioMimeType::Flac).unwrap();
        take.append_chunk(vec![1]);
        take.finalize();
        take.clear();

        assert!(take.begin(AudioMimeType::Flac).is_ok());
        assert!(take.is_recording());
    }

    #[test]
    fn phase_display() {
        assert_eq!(TakePhase::Idle.to_string(), "idle");
        assert_eq!(TakePhase::Recording.to_string(), "recording");
        assert_eq!(TakePhase::Stopped.to_string(), "stopped");
    }

    #[test]
    fn phase_error_display() {
        let err = PhaseError {
            phase: TakePhase::Recording,
            action: "start recording",
        };
        let msg = err.to_string();
        assert!(msg.contains("start recording"));
        assert!(msg.contains("recording"));
    }
}
