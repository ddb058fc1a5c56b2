//! Tempo disambiguation
//!
//! Picks one tempo out of the backend's candidate list, preferring the
//! target genre range and correcting half-time (octave) errors.

use crate::error::TempoError;
use std::ops::RangeInclusive;

/// Tempo range of the target genre (house / techno)
pub const GENRE_RANGE: RangeInclusive<f64> = 120.0..=140.0;

/// Candidates here are assumed to be half-time readings of a genre tempo
pub const HALF_TIME_RANGE: RangeInclusive<f64> = 60.0..=70.0;

/// A median below this is doubled
pub const OCTAVE_CORRECTION_BELOW: f64 = 100.0;

/// Which rule produced the resolved tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoRule {
    /// First candidate inside the genre range
    GenreRange,
    /// Half-time candidate doubled into the genre range
    HalfTimeDoubled,
    /// Median of all candidates
    Median,
    /// Median of all candidates, doubled
    MedianDoubled,
}

/// Result of tempo resolution, full precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTempo {
    pub bpm: f64,
    pub rule: TempoRule,
}

/// Genre-aware tempo resolver
#[derive(Debug, Clone)]
pub struct TempoResolver {
    genre_range: RangeInclusive<f64>,
    half_time_range: RangeInclusive<f64>,
    octave_correction_below: f64,
}

impl TempoResolver {
    pub fn new() -> Self {
        Self {
            genre_range: GENRE_RANGE,
            half_time_range: HALF_TIME_RANGE,
            octave_correction_below: OCTAVE_CORRECTION_BELOW,
        }
    }

    /// Use a custom genre range; the half-time range follows it
    pub fn with_genre_range(mut self, min: f64, max: f64) -> Self {
        self.genre_range = min..=max;
        self.half_time_range = (min / 2.0)..=(max / 2.0);
        self
    }

    pub fn genre_range(&self) -> &RangeInclusive<f64> {
        &self.genre_range
    }

    /// Resolve candidates (in backend priority order) to a single tempo.
    ///
    /// Non-finite candidates are ignored.
    pub fn resolve(&self, candidates: &[f64]) -> Result<ResolvedTempo, TempoError> {
        let candidates: Vec<f64> = candidates.iter().copied().filter(|c| c.is_finite()).collect();
        if candidates.is_empty() {
            return Err(TempoError::NoCandidates);
        }

        if let Some(&bpm) = candidates.iter().find(|c| self.genre_range.contains(c)) {
            return Ok(ResolvedTempo {
                bpm,
                rule: TempoRule::GenreRange,
            });
        }

        let half_time = candidates
            .iter()
            .filter(|c| self.half_time_range.contains(c))
            .map(|c| c * 2.0)
            .find(|doubled| self.genre_range.contains(doubled));
        if let Some(bpm) = half_time {
            return Ok(ResolvedTempo {
                bpm,
                rule: TempoRule::HalfTimeDoubled,
            });
        }

        // No range check after doubling here
        let median = median(&candidates);
        if median < self.octave_correction_below {
            Ok(ResolvedTempo {
                bpm: median * 2.0,
                rule: TempoRule::MedianDoubled,
            })
        } else {
            Ok(ResolvedTempo {
                bpm: median,
                rule: TempoRule::Median,
            })
        }
    }
}

impl Default for TempoResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Median of a non-empty slice; mean of the middle pair for even lengths
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
