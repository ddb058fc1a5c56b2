//! Beat-alignment click tracks for `--debug`

use super::AudioBuffer;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const CLICK_FREQ_HZ: f32 = 1000.0;
const CLICK_SECS: f32 = 0.1;

/// Mix a decaying sine click into the signal at every beat time
pub fn render_click_track(audio: &AudioBuffer, beat_times: &[f64]) -> Vec<f32> {
    let sr = audio.sample_rate as f32;
    let click_len = (CLICK_SECS * sr) as usize;
    let click: Vec<f32> = (0..click_len)
        .map(|i| {
            let t = i as f32 / sr;
            let decay = 2f32.powf(-10.0 * i as f32 / click_len as f32);
            (2.0 * std::f32::consts::PI * CLICK_FREQ_HZ * t).sin() * decay
        })
        .collect();

    let mut mixed = audio.samples.clone();
    for &beat in beat_times {
        let start = (beat * audio.sample_rate as f64).round() as usize;
        if start >= mixed.len() {
            continue;
        }
        for (dst, c) in mixed[start..].iter_mut().zip(&click) {
            *dst += c;
        }
    }
    mixed
}

/// Path of the debug file written next to an analyzed file
pub fn debug_path(audio_path: &Path) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    audio_path.with_file_name(format!("{}_debug.wav", stem))
}

/// Write `<stem>_debug.wav` (16-bit PCM) with clicks on every beat
pub fn write_debug_click_track(
    audio_path: &Path,
    audio: &AudioBuffer,
    beat_times: &[f64],
) -> Result<PathBuf> {
    let out_path = debug_path(audio_path);
    let mixed = render_click_track(audio, beat_times);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&out_path, spec)
        .with_context(|| format!("Failed to create debug file: {:?}", out_path))?;
    for s in mixed {
        let clamped = s.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize debug file: {:?}", out_path))?;

    Ok(out_path)
}
