mod adam;
mod config;
mod gradient_descent;
mod gradient_descent_with_momentum;
mod optimizer;
mod schedule;

pub use adam::Adam;
pub use config::OptimizerConfig;
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use optimizer::Optimizer;
pub use schedule::MultiStepLr;

use crate::{Result, arch::Param};

/// Applies one optimizer step to every parameter, in order, using each position as its slot.
///
/// # Arguments
/// * `optimizer` - The optimizer to step with.
/// * `params` - The model's parameters, always in the same order.
pub fn step<'a, I>(optimizer: &mut dyn Optimizer, params: I) -> Result<()>
where
    I: IntoIterator<Item = &'a mut Param>,
{
    for (slot, param) in params.into_iter().enumerate() {
        let (values, grad) = param.split_mut()?;
        optimizer.update_params(slot, grad, values)?;
    }

    Ok(())
}
