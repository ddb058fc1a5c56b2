use super::PitchClass;
use serde::{Deserialize, Serialize};

/// Number of beat slots in a drum pattern
pub const PATTERN_STEPS: usize = 16;

/// Round `value` to `decimals` digits after the point
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Quantized onset grid: one binary slot per beat, chronological
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct DrumPattern([u8; PATTERN_STEPS]);

impl DrumPattern {
    /// Pattern with every slot empty
    pub fn silent() -> Self {
        Self([0; PATTERN_STEPS])
    }

    /// Build a pattern from per-beat hits; missing trailing beats stay 0
    pub fn from_hits(hits: &[bool]) -> Self {
        let mut slots = [0u8; PATTERN_STEPS];
        for (slot, &hit) in slots.iter_mut().zip(hits) {
            *slot = u8::from(hit);
        }
        Self(slots)
    }

    pub fn slots(&self) -> &[u8; PATTERN_STEPS] {
        &self.0
    }

    /// Number of slots containing a hit
    pub fn hit_count(&self) -> usize {
        self.0.iter().filter(|&&s| s == 1).count()
    }

    /// Text rendering, e.g. `[X... X... X.X. X...]`
    pub fn visualize(&self) -> String {
        let mut bar = String::with_capacity(PATTERN_STEPS + 5);
        bar.push('[');
        for (i, &slot) in self.0.iter().enumerate() {
            bar.push(if slot == 1 { 'X' } else { '.' });
            if (i + 1) % 4 == 0 && i + 1 < PATTERN_STEPS {
                bar.push(' ');
            }
        }
        bar.push(']');
        bar
    }
}

impl TryFrom<Vec<u8>> for DrumPattern {
    type Error = String;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        if values.len() != PATTERN_STEPS {
            return Err(format!(
                "drum pattern must have {} steps, found {}",
                PATTERN_STEPS,
                values.len()
            ));
        }
        let mut slots = [0u8; PATTERN_STEPS];
        for (slot, value) in slots.iter_mut().zip(values) {
            if value > 1 {
                return Err(format!("drum pattern step must be 0 or 1, found {}", value));
            }
            *slot = value;
        }
        Ok(Self(slots))
    }
}

impl From<DrumPattern> for Vec<u8> {
    fn from(pattern: DrumPattern) -> Self {
        pattern.0.to_vec()
    }
}

/// Spectral, loudness and energy descriptors of the extended report
///
/// `energy`, `loudness` and `danceability` come from the optional
/// descriptor backend and are `null` when it is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub energy: Option<f64>,
    pub loudness: Option<f64>,
    pub danceability: Option<f64>,
    pub spectral_centroid: f64,
    pub spectral_bandwidth: f64,
    pub spectral_rolloff: f64,
}

impl Descriptors {
    /// Apply output precision: 3 decimals for loudness-style values,
    /// 2 for spectral frequencies
    pub fn rounded(self) -> Self {
        Self {
            energy: self.energy.map(|v| round_to(v, 3)),
            loudness: self.loudness.map(|v| round_to(v, 3)),
            danceability: self.danceability.map(|v| round_to(v, 3)),
            spectral_centroid: round_to(self.spectral_centroid, 2),
            spectral_bandwidth: round_to(self.spectral_bandwidth, 2),
            spectral_rolloff: round_to(self.spectral_rolloff, 2),
        }
    }
}

/// Analysis result for a single file, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// File name without directory, the collection key
    pub filename: String,

    /// Tempo rounded to one decimal
    pub bpm: f64,

    /// Dominant pitch class
    pub key: PitchClass,

    pub drum_pattern: DrumPattern,

    /// Present only in the extended report
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub descriptors: Option<Descriptors>,
}

impl AnalysisRecord {
    /// Build a record, applying output rounding to the raw values
    pub fn new(
        filename: impl Into<String>,
        bpm: f64,
        key: PitchClass,
        drum_pattern: DrumPattern,
        descriptors: Option<Descriptors>,
    ) -> Self {
        Self {
            filename: filename.into(),
            bpm: round_to(bpm, 1),
            key,
            drum_pattern,
            descriptors: descriptors.map(Descriptors::rounded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(127.96, 1), 128.0);
        assert_eq!(round_to(95.04, 1), 95.0);
        assert_eq!(round_to(0.12345, 3), 0.123);
    }

    #[test]
    fn test_from_hits_pads_with_zeros() {
        let pattern = DrumPattern::from_hits(&[true, false, true]);
        assert_eq!(pattern.slots()[..3], [1, 0, 1]);
        assert!(pattern.slots()[3..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_visualize() {
        let hits: Vec<bool> = (0..16).map(|i| i % 4 == 0).collect();
        let pattern = DrumPattern::from_hits(&hits);
        assert_eq!(pattern.visualize(), "[X... X... X... X...]");
        assert_eq!(DrumPattern::silent().visualize(), "[.... .... .... ....]");
    }

    #[test]
    fn test_pattern_rejects_bad_json() {
        assert!(serde_json::from_str::<DrumPattern>("[1,0,1]").is_err());
        assert!(serde_json::from_str::<DrumPattern>("[2,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]").is_err());
    }

    #[test]
    fn test_basic_record_json_shape() {
        let record = AnalysisRecord::new(
            "loop.wav",
            127.96,
            PitchClass::A,
            DrumPattern::from_hits(&[true]),
            None,
        );
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["bpm"], serde_json::json!(128.0));
        assert_eq!(obj["key"], serde_json::json!("A"));
        assert_eq!(obj["drum_pattern"].as_array().unwrap().len(), 16);
    }

    #[test]
    fn test_extended_record_keeps_null_descriptors() {
        let record = AnalysisRecord::new(
            "loop.wav",
            124.0,
            PitchClass::C,
            DrumPattern::silent(),
            Some(Descriptors {
                energy: None,
                loudness: None,
                danceability: None,
                spectral_centroid: 1523.456,
                spectral_bandwidth: 1800.0,
                spectral_rolloff: 3200.119,
            }),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["energy"].is_null());
        assert!(json.as_object().unwrap().contains_key("loudness"));
        assert_eq!(json["spectral_centroid"], serde_json::json!(1523.46));

        let back: AnalysisRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
