//! Playback transport state

/// Track duration, unknown until the playback resource reports metadata
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrackDuration {
    #[default]
    Pending,
    Known(f64),
}

impl TrackDuration {
    /// Duration in seconds, if known
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Pending => None,
            Self::Known(secs) => Some(*secs),
        }
    }

    /// Whether metadata has not arrived yet
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Events emitted by a playback resource's own clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Playback position moved (seconds)
    Position(f64),
    /// Metadata arrived with the track duration (seconds)
    Duration(f64),
    /// The track played to its natural end
    Ended,
}

/// Live transport state for one attached audio source.
///
/// Position never exceeds the duration once the duration is known; seek and
/// volume inputs are clamped into range rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    position: f64,
    duration: TrackDuration,
    volume: f32,
    playing: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            position: 0.0,
            duration: TrackDuration::Pending,
            volume: 1.0,
            playing: false,
        }
    }
}

impl Transport {
    /// Create transport state for a freshly attached source
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in seconds
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Track duration
    pub fn duration(&self) -> TrackDuration {
        self.duration
    }

    /// Current volume in [0.0, 1.0]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Set the playing flag
    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Reset for a source change: position to 0, duration to pending,
    /// playing to false. The volume setting survives the change.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.duration = TrackDuration::Pending;
        self.playing = false;
    }

    /// Convert a percent-of-duration seek input in [0, 100] to an absolute
    /// position, clamped into [0, duration], and move the model position
    /// there. Returns `None` while the duration is pending, in which case
    /// nothing changes.
    pub fn seek_percent(&mut self, percent: f64) -> Option<f64> {
        let duration = self.duration.seconds()?;
        let clamped = percent.clamp(0.0, 100.0);
        let target = (clamped / 100.0 * duration).clamp(0.0, duration);
        self.position = target;
        Some(target)
    }

    /// Convert a percent-of-max volume input in [0, 100] to a volume in
    /// [0.0, 1.0], clamped, and apply it. Returns the resulting volume.
    pub fn set_volume_percent(&mut self, percent: f64) -> f32 {
        let volume = (percent / 100.0).clamp(0.0, 1.0) as f32;
        self.volume = volume;
        volume
    }

    /// Progress through the track as a percentage, 0 while the duration is
    /// pending or zero.
    pub fn progress_percent(&self) -> f64 {
        match self.duration.seconds() {
            Some(duration) if duration > 0.0 => (self.position / duration * 100.0).min(100.0),
            _ => 0.0,
        }
    }

    /// Apply an event from the playback resource
    pub fn apply(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Position(secs) => {
                let secs = secs.max(0.0);
                self.position = match self.duration.seconds() {
                    Some(duration) => secs.min(duration),
                    None => secs,
                };
            }
            PlaybackEvent::Duration(secs) => {
                let duration = secs.max(0.0);
                self.duration = TrackDuration::Known(duration);
                self.position = self.position.min(duration);
            }
            PlaybackEvent::Ended => {
                self.playing = false;
                if let Some(duration) = self.duration.seconds() {
                    self.position = duration;
                }
            }
        }
    }
}
