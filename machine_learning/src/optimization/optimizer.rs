use crate::{MlErr, Result};

/// Defines the strategy for updating model parameters based on calculated gradients.
///
/// Stateful algorithms keep their state per `slot`, the position of the parameter in the
/// model's parameter list, so the same slot must always be passed for the same parameter.
pub trait Optimizer: Send {
    /// Updates the provided slice of parameters using the accumulated gradient.
    ///
    /// # Arguments
    /// * `slot` - The position of this parameter within the model.
    /// * `grad` - The gradient of the parameter.
    /// * `params` - The parameter values to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, slot: usize, grad: &[f32], params: &mut [f32]) -> Result<()>;

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, learning_rate: f32);
}

pub(super) fn check_sizes(grad: &[f32], params: &[f32]) -> Result<()> {
    if grad.len() != params.len() {
        return Err(MlErr::SizeMismatch {
            what: "gradient and parameters",
            got: grad.len(),
            expected: params.len(),
        });
    }

    Ok(())
}

/// Returns the state buffer of `slot`, allocating a zeroed one of `len` scalars on first use.
pub(super) fn slot_state(states: &mut Vec<Box<[f32]>>, slot: usize, len: usize) -> Result<&mut [f32]> {
    if states.len() <= slot {
        states.resize_with(slot + 1, Default::default);
    }

    let state = &mut states[slot];
    if state.is_empty() {
        *state = vec![0.; len].into_boxed_slice();
    }

    if state.len() != len {
        return Err(MlErr::SizeMismatch {
            what: "optimizer state",
            got: len,
            expected: state.len(),
        });
    }

    Ok(state)
}
