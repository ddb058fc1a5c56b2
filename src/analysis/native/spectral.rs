//! Frame-averaged spectral shape statistics

use super::stft::Spectrogram;
use crate::analysis::traits::SpectralStats;

/// Fraction of spectral energy below the rolloff frequency
pub const ROLLOFF_PERCENT: f32 = 0.85;

/// Mean centroid, bandwidth and 85% rolloff over non-silent frames
pub fn spectral_stats(spec: &Spectrogram) -> SpectralStats {
    let freqs: Vec<f32> = (0..spec.num_bins()).map(|b| spec.bin_frequency(b)).collect();

    let mut sum = SpectralStats::default();
    let mut counted = 0usize;

    for frame in &spec.frames {
        let total: f32 = frame.iter().sum();
        if total <= f32::EPSILON {
            continue;
        }

        let centroid = frame.iter().zip(&freqs).map(|(m, f)| m * f).sum::<f32>() / total;

        let bandwidth = (frame
            .iter()
            .zip(&freqs)
            .map(|(m, f)| m * (f - centroid).powi(2))
            .sum::<f32>()
            / total)
            .sqrt();

        let target = ROLLOFF_PERCENT * total;
        let mut cumulative = 0.0f32;
        let mut rolloff = freqs.last().copied().unwrap_or(0.0);
        for (m, &f) in frame.iter().zip(&freqs) {
            cumulative += m;
            if cumulative >= target {
                rolloff = f;
                break;
            }
        }

        sum.centroid += centroid as f64;
        sum.bandwidth += bandwidth as f64;
        sum.rolloff += rolloff as f64;
        counted += 1;
    }

    if counted == 0 {
        return SpectralStats::default();
    }

    let n = counted as f64;
    SpectralStats {
        centroid: sum.centroid / n,
        bandwidth: sum.bandwidth / n,
        rolloff: sum.rolloff / n,
    }
}
