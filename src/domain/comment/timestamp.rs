//! Timestamp reference value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TimestampParseError;

/// A moment in the referenced performance video that a comment points at,
/// written `minutes:seconds` (e.g. "1:24"). Validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampRef {
    seconds: u64,
}

impl TimestampRef {
    /// Create a reference from a total second count
    pub const fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Total seconds into the video
    pub const fn as_secs(&self) -> u64 {
        self.seconds
    }
}

impl FromStr for TimestampRef {
    type Err = TimestampParseError;

    /// Parse a `minutes:seconds` string; the seconds part must be two
    /// digits at most and below 60.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let err = || TimestampParseError {
            input: s.to_string(),
        };

        let (minutes, seconds) = input.split_once(':').ok_or_else(err)?;
        if minutes.is_empty() || seconds.is_empty() || seconds.len() > 2 {
            return Err(err());
        }

        let minutes: u64 = minutes.parse().map_err(|_| err())?;
        let seconds: u64 = seconds.parse().map_err(|_| err())?;
        if seconds >= 60 {
            return Err(err());
        }

        Ok(Self {
            seconds: minutes * 60 + seconds,
        })
    }
}

impl fmt::Display for TimestampRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minutes_and_seconds() {
        let ts: TimestampRef = "1:24".parse().unwrap();
        assert_eq!(ts.as_secs(), 84);
    }

    #[test]
    fn parse_zero() {
        let ts: TimestampRef = "0:00".parse().unwrap();
        assert_eq!(ts.as_secs(), 0);
    }

    #[test]
    fn parse_with_whitespace() {
        let ts: TimestampRef = "  2:15 ".parse().unwrap();
        assert_eq!(ts.as_secs(), 135);
    }

    #[test]
    fn parse_rejects_seconds_of_sixty_or_more() {
        assert!("1:60".parse::<TimestampRef>().is_err());
        assert!("1:99".parse::<TimestampRef>().is_err());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("".parse::<TimestampRef>().is_err());
        assert!("124".parse::<TimestampRef>().is_err());
        assert!("1:2:3".parse::<TimestampRef>().is_err());
        assert!("a:10".parse::<TimestampRef>().is_err());
        assert!("1:".parse::<TimestampRef>().is_err());
        assert!(":30".parse::<TimestampRef>().is_err());
        assert!("1:123".parse::<TimestampRef>().is_err());
    }

    #[test]
    fn display_zero_pads_seconds() {
        assert_eq!(TimestampRef::from_secs(84).to_string(), "1:24");
        assert_eq!(TimestampRef::from_secs(65).to_string(), "1:05");
        assert_eq!(TimestampRef::from_secs(0).to_string(), "0:00");
    }

    #[test]
    fn round_trip() {
        let ts: TimestampRef = "3:07".parse().unwrap();
        assert_eq!(ts.to_string(), "3:07");
    }
}
