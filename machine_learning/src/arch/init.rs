use ndarray::{ArrayD, IxDyn};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use super::Param;
use crate::{MlErr, Result};

/// Samples a parameter uniformly in `[-bound, bound)`.
///
/// # Arguments
/// * `rng` - A random number generator.
/// * `shape` - The shape of the parameter.
/// * `bound` - The half width of the sampling interval.
///
/// # Returns
/// An error if the calculated range is invalid.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, shape: &[usize], bound: f32) -> Result<Param> {
    let dist = Uniform::new(-bound, bound).map_err(|e| MlErr::Init(e.to_string()))?;
    Ok(Param::new(ArrayD::random_using(IxDyn(shape), dist, rng)))
}

/// Kaiming uniform initialization with the `a = sqrt(5)` leaky slope, which reduces to a bound
/// of `1 / sqrt(fan_in)`.
///
/// # Arguments
/// * `rng` - A random number generator.
/// * `shape` - The shape of the parameter.
/// * `fan_in` - The number of input units feeding each output unit.
///
/// # Returns
/// An error if `fan_in` is zero.
pub fn kaiming_uniform<R: Rng + ?Sized>(
    rng: &mut R,
    shape: &[usize],
    fan_in: usize,
) -> Result<Param> {
    if fan_in == 0 {
        return Err(MlErr::Init("fan_in must be positive".into()));
    }

    uniform(rng, shape, 1. / (fan_in as f32).sqrt())
}
