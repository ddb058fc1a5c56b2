//! Beat-quantized drum pattern extraction

use crate::error::PatternError;
use crate::model::{DrumPattern, PATTERN_STEPS};

/// Windows open this long before the nominal beat to absorb onset jitter
pub const ONSET_LEAD_SECS: f64 = 0.05;

/// Map onset times onto one slot per beat for the first 16 beats.
///
/// Each slot covers `[beat - 0.05, beat - 0.05 + 60 / tempo)` (start
/// clamped at 0). Beats past the end of the timeline leave zero slots.
pub fn quantize_pattern(
    beat_times: &[f64],
    onset_times: &[f64],
    tempo: f64,
) -> Result<DrumPattern, PatternError> {
    if !tempo.is_finite() || tempo <= 0.0 {
        return Err(PatternError::InvalidTempo(tempo));
    }

    let beat_period = 60.0 / tempo;
    let hits: Vec<bool> = beat_times
        .iter()
        .take(PATTERN_STEPS)
        .map(|&beat| {
            let start = (beat - ONSET_LEAD_SECS).max(0.0);
            let end = start + beat_period;
            onset_times.iter().any(|&t| t >= start && t < end)
        })
        .collect();

    Ok(DrumPattern::from_hits(&hits))
}
