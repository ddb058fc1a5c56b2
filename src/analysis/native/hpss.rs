//! Median-filter harmonic/percussive separation on a magnitude spectrogram
//!
//! Harmonic energy is smooth along time, percussive energy is smooth along
//! frequency. Each component is enhanced by a median filter in its
//! direction and the two are turned into Wiener-style soft masks.

/// Separated magnitude spectrograms, same shape as the input
#[derive(Debug, Clone)]
pub struct Separated {
    pub harmonic: Vec<Vec<f32>>,
    pub percussive: Vec<Vec<f32>>,
}

/// Split `magnitude` (`[frame][bin]`) with median kernels of `kernel` taps
pub fn separate(magnitude: &[Vec<f32>], kernel: usize) -> Separated {
    let num_frames = magnitude.len();
    let num_bins = magnitude.first().map_or(0, Vec::len);
    let half = kernel / 2;

    let mut scratch = Vec::with_capacity(kernel);

    // Median along time, per bin
    let mut harmonic_enh = vec![vec![0.0f32; num_bins]; num_frames];
    for bin in 0..num_bins {
        for t in 0..num_frames {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(num_frames);
            scratch.clear();
            scratch.extend(magnitude[lo..hi].iter().map(|frame| frame[bin]));
            harmonic_enh[t][bin] = median_in_place(&mut scratch);
        }
    }

    // Median along frequency, per frame
    let mut percussive_enh = vec![vec![0.0f32; num_bins]; num_frames];
    for (t, frame) in magnitude.iter().enumerate() {
        for bin in 0..num_bins {
            let lo = bin.saturating_sub(half);
            let hi = (bin + half + 1).min(num_bins);
            scratch.clear();
            scratch.extend_from_slice(&frame[lo..hi]);
            percussive_enh[t][bin] = median_in_place(&mut scratch);
        }
    }

    let mut harmonic = vec![vec![0.0f32; num_bins]; num_frames];
    let mut percussive = vec![vec![0.0f32; num_bins]; num_frames];
    for t in 0..num_frames {
        for bin in 0..num_bins {
            let h2 = harmonic_enh[t][bin].powi(2);
            let p2 = percussive_enh[t][bin].powi(2);
            let total = h2 + p2;
            if total <= f32::MIN_POSITIVE {
                continue;
            }
            let mag = magnitude[t][bin];
            harmonic[t][bin] = mag * h2 / total;
            percussive[t][bin] = mag * p2 / total;
        }
    }

    Separated {
        harmonic,
        percussive,
    }
}

fn median_in_place(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    *median
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sustained_tone_is_harmonic() {
        // one bin lit in every frame
        let magnitude: Vec<Vec<f32>> = (0..40)
            .map(|_| {
                let mut frame = vec![0.0f32; 64];
                frame[10] = 1.0;
                frame
            })
            .collect();
        let sep = separate(&magnitude, 17);

        assert!(sep.harmonic[20][10] > 0.9);
        assert!(sep.percussive[20][10] < 0.1);
    }

    #[test]
    fn test_broadband_click_is_percussive() {
        // every bin lit in one frame
        let magnitude: Vec<Vec<f32>> = (0..40)
            .map(|t| vec![if t == 20 { 1.0 } else { 0.0 }; 64])
            .collect();
        let sep = separate(&magnitude, 17);

        assert!(sep.percussive[20][30] > 0.9);
        assert!(sep.harmonic[20][30] < 0.1);
    }

    #[test]
    fn test_empty_input() {
        let sep = separate(&[], 17);
        assert!(sep.harmonic.is_empty());
        assert!(sep.percussive.is_empty());
    }
}
