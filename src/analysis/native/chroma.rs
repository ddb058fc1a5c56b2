//! Chroma from an STFT magnitude spectrogram

use super::stft::Spectrogram;
use crate::analysis::traits::Chroma;
use crate::model::PITCH_CLASSES;

/// Bins below this frequency are too coarse to resolve semitones
const MIN_FREQ_HZ: f32 = 55.0;
const MAX_FREQ_HZ: f32 = 5000.0;

/// Pitch class (0 = C) of a frequency, by nearest equal-tempered semitone
pub fn pitch_class_of(freq: f32) -> usize {
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    (midi.round() as i64).rem_euclid(PITCH_CLASSES as i64) as usize
}

/// Fold spectral power into 12 pitch classes per frame, each frame
/// scaled so its strongest class is 1 (silent frames stay 0)
pub fn chroma_from_spectrogram(spec: &Spectrogram, magnitude: &[Vec<f32>]) -> Chroma {
    let bin_classes: Vec<Option<usize>> = (0..spec.num_bins())
        .map(|bin| {
            let freq = spec.bin_frequency(bin);
            (MIN_FREQ_HZ..=MAX_FREQ_HZ)
                .contains(&freq)
                .then(|| pitch_class_of(freq))
        })
        .collect();

    let frames = magnitude
        .iter()
        .map(|frame| {
            let mut classes = [0.0f32; PITCH_CLASSES];
            for (mag, class) in frame.iter().zip(&bin_classes) {
                if let Some(class) = class {
                    classes[*class] += mag * mag;
                }
            }

            let peak = classes.iter().copied().fold(0.0f32, f32::max);
            if peak > f32::MIN_POSITIVE {
                for c in classes.iter_mut() {
                    *c /= peak;
                }
            }
            classes
        })
        .collect();

    Chroma::new(frames)
}
