//! Finalized audio artifact value object

use std::fmt;

/// Supported audio MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Flac,
    Ogg,
    Mp3,
    Wav,
    Webm,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mp3",
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Webm => "webm",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for AudioMimeType {
    fn default() -> Self {
        Self::Flac
    }
}

/// Value object representing one finished recording take.
/// Immutable once produced: the bytes are frozen at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    data: Vec<u8>,
    content_type: AudioMimeType,
}

impl AudioArtifact {
    /// Create an artifact from raw bytes
    pub fn new(data: Vec<u8>, content_type: AudioMimeType) -> Self {
        Self { data, content_type }
    }

    /// Concatenate an ordered chunk sequence into one artifact.
    /// The result's byte length equals the sum of the chunk lengths.
    pub fn from_chunks<I>(chunks: I, content_type: AudioMimeType) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut data = Vec::new();
        for chunk in chunks {
            data.extend_from_slice(&chunk);
        }
        Self { data, content_type }
    }

    /// Get the raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the content type tag
    pub fn content_type(&self) -> AudioMimeType {
        self.content_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
