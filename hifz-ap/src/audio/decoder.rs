//! Audio decoder using symphonia
//!
//! Decodes a whole recitation clip held in memory to interleaved f32 PCM.
//! Verse clips are short (seconds to a few minutes), so decoding up front
//! keeps the output callback trivial.

use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Fully decoded clip
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples, `channels` per frame
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode an encoded clip
///
/// # Arguments
/// - `bytes`: complete encoded file contents
/// - `extension`: format hint such as `"mp3"`
///
/// # Errors
/// `Error::Decode` if the format is unrecognised, has no audio track, or
/// yields no samples.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame; skip it
                warn!("Decode error: {}", e);
                continue;
            }
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let too_small = buffer
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * channels);
        if too_small {
            buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = buffer.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if samples.is_empty() || sample_rate == 0 || channels == 0 {
        return Err(Error::Decode("No audio samples decoded".to_string()));
    }

    let audio = DecodedAudio {
        samples,
        sample_rate,
        channels,
    };
    debug!(
        "Decoded {} frames at {} Hz, {} channel(s) ({:.1}s)",
        audio.frames(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs()
    );
    Ok(audio)
}
