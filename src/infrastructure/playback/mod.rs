//! Playback infrastructure adapters

mod rodio;

pub use self::rodio::RodioPlaybackSink;
