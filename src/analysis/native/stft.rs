//! Short-time Fourier transform

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Magnitude spectrogram, frame-major (`frames[t][bin]`)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub n_fft: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
    pub frames: Vec<Vec<f32>>,
}

impl Spectrogram {
    /// Centered STFT with a periodic Hann window.
    ///
    /// The signal is zero padded by `n_fft / 2` on both sides, so frame `t`
    /// is centered on sample `t * hop_length`.
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop_length: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);

        let window: Vec<f32> = (0..n_fft)
            .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n_fft as f32).cos())
            .collect();

        let pad = n_fft / 2;
        let num_frames = 1 + samples.len() / hop_length;
        let num_bins = n_fft / 2 + 1;

        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

        for t in 0..num_frames {
            let origin = (t * hop_length) as isize - pad as isize;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = origin + i as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * window[i], 0.0);
            }

            fft.process(&mut buffer);

            frames.push(buffer[..num_bins].iter().map(|c| c.norm()).collect());
        }

        Self {
            n_fft,
            hop_length,
            sample_rate,
            frames,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Center frequency of an FFT bin in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.n_fft as f32
    }

    /// Analysis frames per second
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.hop_length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_and_bins() {
        let samples = vec![0.0f32; 44_100];
        let spec = Spectrogram::compute(&samples, 44_100, 2048, 512);
        assert_eq!(spec.num_frames(), 1 + 44_100 / 512);
        assert!(spec.frames.iter().all(|f| f.len() == 1025));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let sr = 44_100;
        let freq = 440.0;
        let samples: Vec<f32> = (0..sr)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let spec = Spectrogram::compute(&samples, sr as u32, 2048, 512);

        let frame = &spec.frames[40];
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((spec.bin_frequency(peak) - freq).abs() < spec.bin_frequency(1));
    }
}
