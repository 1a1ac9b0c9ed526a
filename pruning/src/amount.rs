use crate::{PruneErr, Result};

/// Validates a pruning intensity.
///
/// # Returns
/// `InvalidIntensity` if `intensity` is NaN or outside `[0, 1]`.
pub(crate) fn check_intensity(intensity: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&intensity) {
        return Err(PruneErr::InvalidIntensity(intensity));
    }

    Ok(intensity)
}

/// Returns how many of `n` units to prune at `intensity`, rounding half to even.
pub(crate) fn units_to_prune(intensity: f64, n: usize) -> usize {
    let k = (intensity * n as f64).round_ties_even() as usize;
    k.min(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_and_nan() {
        for a in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            assert!(check_intensity(a).is_err(), "{a}");
        }

        assert_eq!(check_intensity(0.).unwrap(), 0.);
        assert_eq!(check_intensity(1.).unwrap(), 1.);
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(units_to_prune(0.5, 5), 2);
        assert_eq!(units_to_prune(0.5, 7), 4);
        assert_eq!(units_to_prune(0.3, 100), 30);
        assert_eq!(units_to_prune(0.05, 10), 0);
        assert_eq!(units_to_prune(0.15, 10), 2);
        assert_eq!(units_to_prune(1., 9), 9);
    }
}
