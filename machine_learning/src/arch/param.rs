use ndarray::{ArrayD, IxDyn};

use crate::{MlErr, Result};

/// A trainable tensor together with the buffer its gradient is accumulated into.
#[derive(Debug, Clone)]
pub struct Param {
    value: ArrayD<f32>,
    grad: ArrayD<f32>,
}

impl Param {
    /// Creates a new `Param` with a zeroed gradient of the same shape as `value`.
    ///
    /// # Arguments
    /// * `value` - The initial value of the parameter.
    ///
    /// # Returns
    /// A new `Param` instance.
    pub fn new(value: ArrayD<f32>) -> Self {
        let grad = ArrayD::zeros(value.raw_dim());
        Self { value, grad }
    }

    /// Creates a new `Param` filled with `fill`.
    pub fn filled(shape: &[usize], fill: f32) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), fill))
    }

    pub fn value(&self) -> &ArrayD<f32> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.value
    }

    pub fn grad(&self) -> &ArrayD<f32> {
        &self.grad
    }

    pub fn grad_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.grad
    }

    /// Returns the amount of scalars in this parameter.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Resets the accumulated gradient to zero.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.);
    }

    /// Gives raw access to the parameter values and the gradient at the same time.
    ///
    /// # Returns
    /// A tuple of (values, gradient) or an error if either is not contiguous.
    pub fn split_mut(&mut self) -> Result<(&mut [f32], &[f32])> {
        let grad = self
            .grad
            .as_slice_memory_order()
            .ok_or(MlErr::NonContiguous { what: "gradient" })?;

        let value = self
            .value
            .as_slice_memory_order_mut()
            .ok_or(MlErr::NonContiguous { what: "parameter" })?;

        Ok((value, grad))
    }

    /// Counts the entries of the value tensor that are not exactly zero.
    pub fn nonzero(&self) -> usize {
        self.value.iter().filter(|w| **w != 0.).count()
    }
}
