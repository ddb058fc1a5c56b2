//! Audio decoding to analysis-ready mono samples
//!
//! Files are decoded with symphonia, downmixed to mono, resampled to the
//! analysis rate, cut to the analysis window and trimmed of leading and
//! trailing silence.

use super::AudioBuffer;
use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Sample rate every file is analyzed at
pub const ANALYSIS_SAMPLE_RATE: u32 = 44_100;

/// Only the start of each file is analyzed
pub const MAX_ANALYSIS_SECS: u32 = 60;

/// Frames quieter than this (dB below the loudest frame) count as silence
const TRIM_TOP_DB: f32 = 20.0;
const TRIM_FRAME: usize = 2048;
const TRIM_HOP: usize = 512;

/// Decode, resample, cut and trim an audio file for analysis
pub fn load_for_analysis(path: &Path) -> Result<AudioBuffer> {
    let (decoded, sample_rate) = decode_to_mono(path, MAX_ANALYSIS_SECS)?;
    log::debug!(
        "Decoded {} samples ({:.1}s) at {}Hz",
        decoded.len(),
        decoded.len() as f32 / sample_rate as f32,
        sample_rate
    );

    let samples = resample_linear(&decoded, sample_rate, ANALYSIS_SAMPLE_RATE);
    let trimmed = trim_silence(&samples, TRIM_TOP_DB);
    if trimmed.len() < samples.len() {
        log::debug!("Trimmed {} silent samples", samples.len() - trimmed.len());
    }

    Ok(AudioBuffer::new(trimmed.to_vec(), ANALYSIS_SAMPLE_RATE))
}

/// Decode the first audio track to mono f32 samples, keeping at most
/// `max_secs` of audio
fn decode_to_mono(path: &Path, max_secs: u32) -> Result<(Vec<f32>, u32)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {:?}", path))?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut format = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio format: {:?}", path))?
        .format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("No sample rate in audio track")?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let limit = sample_rate as usize * max_secs as usize;
    let mut mono = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                log::warn!("{:?}: stopped reading packets: {}", path, e);
                break;
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("{:?}: skipping undecodable packet: {}", path, e);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to decode {:?}", path)),
        };

        let spec = *decoded.spec();
        let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        interleaved.copy_interleaved_ref(decoded);

        if append_mono(&mut mono, interleaved.samples(), spec.channels.count(), limit) {
            log::info!("  Analyzing first {} seconds only", max_secs);
            break;
        }
    }

    if mono.is_empty() {
        anyhow::bail!("No audio samples decoded from {:?}", path);
    }

    Ok((mono, sample_rate))
}

/// Average interleaved frames into `mono`, stopping at `limit` samples.
/// Returns true once the limit is reached.
fn append_mono(mono: &mut Vec<f32>, interleaved: &[f32], channels: usize, limit: usize) -> bool {
    let channels = channels.max(1);
    let room = limit.saturating_sub(mono.len());
    let frames = interleaved.chunks_exact(channels);
    let full = frames.len() >= room;

    mono.extend(
        frames
            .take(room)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
    full
}

/// Linear-interpolation resampler
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).floor() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(last)];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

/// Strip leading and trailing frames more than `top_db` below the
/// loudest frame. An all-silent signal trims to nothing.
pub fn trim_silence(samples: &[f32], top_db: f32) -> &[f32] {
    if samples.is_empty() {
        return samples;
    }

    let powers: Vec<f32> = frame_starts(samples.len())
        .map(|start| {
            let frame = &samples[start..(start + TRIM_FRAME).min(samples.len())];
            frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32
        })
        .collect();

    let peak = powers.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return &samples[..0];
    }

    let threshold = peak * 10f32.powf(-top_db / 10.0);
    let loud = |p: &f32| *p > threshold;

    let (Some(first), Some(last)) = (powers.iter().position(loud), powers.iter().rposition(loud))
    else {
        return &samples[..0];
    };

    let start = first * TRIM_HOP;
    let end = (last * TRIM_HOP + TRIM_FRAME).min(samples.len());
    &samples[start..end]
}

fn frame_starts(len: usize) -> impl Iterator<Item = usize> {
    let frames = if len <= TRIM_FRAME {
        1
    } else {
        (len - TRIM_FRAME) / TRIM_HOP + 1
    };
    (0..frames).map(|i| i * TRIM_HOP)
}
