use machine_learning::arch::Param;

use crate::{
    PruningPolicy, Result,
    amount::{check_intensity, units_to_prune},
    mask::{Cutoff, apply},
    unstructured::flat_values,
};

/// Pools the entries of every weight tensor and zeroes the ones of lowest magnitude across the
/// whole pool, so layers with smaller weights lose a larger share.
///
/// Ties are broken by layer order, then by position within the layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalUnstructured;

impl PruningPolicy for GlobalUnstructured {
    fn name(&self) -> &'static str {
        "global_unstructured"
    }

    fn prune_weights(&self, weights: &mut [&mut Param], intensity: f64) -> Result<()> {
        let intensity = check_intensity(intensity)?;
        let slices = flat_values(weights)?;

        let scores: Vec<f32> = slices.iter().flat_map(|v| v.iter().map(|w| w.abs())).collect();
        let k = units_to_prune(intensity, scores.len());

        let Some(mut cutoff) = Cutoff::lowest(&scores, k) else {
            return Ok(());
        };

        for values in slices {
            let mask: Vec<bool> = values.iter().map(|w| cutoff.take(w.abs())).collect();
            apply(values, mask);
        }

        Ok(())
    }
}
