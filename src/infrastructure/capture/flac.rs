//! FLAC encoding for finished takes
//!
//! Spoken feedback is captured mono and normalized to 16kHz before
//! encoding, which keeps uploads small while staying lossless and
//! decodable by every mainstream player.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

/// Sample rate every take is normalized to
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// Take encoding errors
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("FLAC encoder config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),
}

/// Encode a finished take (mono i16 samples at the device rate) into a
/// FLAC stream at the target rate.
pub fn encode_take(samples: &[i16], source_rate: u32) -> Result<Vec<u8>, EncodeError> {
    let normalized = resample_to_target(samples, source_rate)?;
    encode_flac(&normalized)
}

fn encode_flac(samples: &[i16]) -> Result<Vec<u8>, EncodeError> {
    // flacenc works on i32 samples internally
    let widened: Vec<i32> = samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodeError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &widened,
        CHANNELS,
        BITS_PER_SAMPLE,
        TARGET_SAMPLE_RATE as usize,
    );

    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodeError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| EncodeError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// Resample mono samples from the device rate to the target rate
fn resample_to_target(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, EncodeError> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let expected_len = (input.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        1024, // chunk size
        2,    // sub-chunks
        1,    // mono
    )
    .map_err(|e| EncodeError::Resample(e.to_string()))?;

    let mut output = Vec::with_capacity(expected_len);
    let mut consumed = 0;

    while consumed < input.len() {
        let needed = resampler.input_frames_next();
        let end = (consumed + needed).min(input.len());
        let mut block = input[consumed..end].to_vec();
        // The final block gets zero-padded up to the resampler's frame size
        block.resize(needed, 0.0);

        let resampled = resampler
            .process(&[block], None)
            .map_err(|e| EncodeError::Resample(e.to_string()))?;
        output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        consumed = end;
    }

    output.truncate(expected_len);
    Ok(output)
}
