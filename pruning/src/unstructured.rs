use machine_learning::{MlErr, arch::Param};

use crate::{
    PruneErr, PruningPolicy, Result,
    amount::{check_intensity, units_to_prune},
    mask::{apply, lowest_mask},
};

/// Prunes every weight tensor on its own, zeroing its entries of lowest magnitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Unstructured;

impl PruningPolicy for L1Unstructured {
    fn name(&self) -> &'static str {
        "l1_unstructured"
    }

    fn prune_weights(&self, weights: &mut [&mut Param], intensity: f64) -> Result<()> {
        let intensity = check_intensity(intensity)?;
        let slices = flat_values(weights)?;

        for values in slices {
            let scores: Vec<f32> = values.iter().map(|w| w.abs()).collect();
            let k = units_to_prune(intensity, values.len());
            apply(values, lowest_mask(&scores, k));
        }

        Ok(())
    }
}

/// Borrows the values of every weight as a flat, row major slice.
pub(crate) fn flat_values<'a>(weights: &'a mut [&mut Param]) -> Result<Vec<&'a mut [f32]>> {
    weights
        .iter_mut()
        .map(|param| {
            param
                .value_mut()
                .as_slice_mut()
                .ok_or(PruneErr::Ml(MlErr::NonContiguous { what: "weight" }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use machine_learning::arch::Param;
    use ndarray::{ArrayD, IxDyn};

    use super::*;

    fn param(values: &[f32]) -> Param {
        Param::new(ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec()).unwrap())
    }

    #[test]
    fn each_layer_loses_its_own_fraction() {
        let mut a = param(&[1., 2., 3., 4.]);
        let mut b = param(&[100., 200., 300., 400.]);

        L1Unstructured
            .prune_weights(&mut [&mut a, &mut b], 0.5)
            .unwrap();

        assert_eq!(a.value().as_slice().unwrap(), [0., 0., 3., 4.]);
        assert_eq!(b.value().as_slice().unwrap(), [0., 0., 300., 400.]);
    }

    #[test]
    fn magnitude_not_sign() {
        let mut a = param(&[-5., 1., -0.5, 2.]);
        L1Unstructured.prune_weights(&mut [&mut a], 0.5).unwrap();
        assert_eq!(a.value().as_slice().unwrap(), [-5., 0., 0., 2.]);
    }

    #[test]
    fn invalid_intensity_touches_nothing() {
        let mut a = param(&[1., 2.]);
        let err = L1Unstructured.prune_weights(&mut [&mut a], 1.5);

        assert!(matches!(err, Err(crate::PruneErr::InvalidIntensity(_))));
        assert_eq!(a.value().as_slice().unwrap(), [1., 2.]);
    }
}
