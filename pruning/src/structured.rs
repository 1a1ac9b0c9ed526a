use machine_learning::arch::Param;
use ndarray::Axis;
use serde::Serialize;

use crate::{
    PruneErr, PruningPolicy, Result,
    amount::{check_intensity, units_to_prune},
    mask::lowest_mask,
};

/// The norm ranking the slices of a weight tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Norm {
    #[default]
    L1,
    L2,
    Inf,
}

impl Norm {
    fn of<'a>(self, values: impl Iterator<Item = &'a f32>) -> f32 {
        match self {
            Norm::L1 => values.map(|w| w.abs()).sum(),
            Norm::L2 => values.map(|w| w * w).sum::<f32>().sqrt(),
            Norm::Inf => values.map(|w| w.abs()).fold(0., f32::max),
        }
    }
}

/// Prunes every weight tensor on its own, zeroing whole slices along `dim` of lowest norm.
///
/// With the default `dim` of 1, the slices of a `[out, in, kh, kw]` convolution kernel are its
/// input channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LnStructured {
    dim: usize,
    norm: Norm,
}

impl LnStructured {
    pub fn new(dim: usize, norm: Norm) -> Self {
        Self { dim, norm }
    }
}

impl Default for LnStructured {
    fn default() -> Self {
        Self::new(1, Norm::L1)
    }
}

impl PruningPolicy for LnStructured {
    fn name(&self) -> &'static str {
        match self.norm {
            Norm::L1 => "l1_structured",
            Norm::L2 => "l2_structured",
            Norm::Inf => "linf_structured",
        }
    }

    fn prune_weights(&self, weights: &mut [&mut Param], intensity: f64) -> Result<()> {
        let intensity = check_intensity(intensity)?;
        let Self { dim, norm } = *self;

        if let Some(param) = weights.iter().find(|p| p.shape().len() <= dim) {
            return Err(PruneErr::InvalidDimension {
                dim,
                ndim: param.shape().len(),
            });
        }

        for param in weights.iter_mut() {
            let value = param.value_mut();
            let axis = Axis(dim);

            let norms: Vec<f32> = value
                .axis_iter(axis)
                .map(|slice| norm.of(slice.iter()))
                .collect();

            let k = units_to_prune(intensity, norms.len());
            for (j, prune) in lowest_mask(&norms, k).into_iter().enumerate() {
                if prune {
                    value.index_axis_mut(axis, j).fill(0.);
                }
            }
        }

        Ok(())
    }
}
