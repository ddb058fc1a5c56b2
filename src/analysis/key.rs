//! Key estimation from chroma energy

use super::traits::Chroma;
use crate::model::PitchClass;

/// Pitch class with the highest mean chroma energy.
///
/// Ties go to the lowest index and NaN means are skipped. `None` when the
/// chroma has no frames or every mean is NaN.
pub fn estimate_key(chroma: &Chroma) -> Option<PitchClass> {
    let means = chroma.mean_energy()?;

    let mut best: Option<(usize, f64)> = None;
    for (i, &mean) in means.iter().enumerate() {
        if mean.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if mean <= top => {}
            _ => best = Some((i, mean)),
        }
    }

    best.and_then(|(i, _)| PitchClass::from_index(i))
}
