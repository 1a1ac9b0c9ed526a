use ndarray::{Array2, ArrayD};

use super::{Param, layers::LayerSelector};
use crate::Result;

/// A trainable classifier.
///
/// Cloning a model is a deep copy: the clone owns all of its tensors and shares no mutable
/// storage with the original, so a clone can be pruned or trained without affecting its source.
pub trait Model: Clone + Send + Sync {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Computes the model's output rows for `x` without caching anything for a backward pass.
    /// Batch normalization uses its running statistics.
    fn infer(&self, x: ArrayD<f32>) -> Result<Array2<f32>>;

    /// Computes the model's output rows for `x`, keeping what `backward` needs.
    fn forward(&mut self, x: ArrayD<f32>) -> Result<Array2<f32>>;

    /// Propagates the gradient of the loss w.r.t. the output backwards, accumulating the
    /// gradient of every parameter.
    fn backward(&mut self, d: Array2<f32>) -> Result<()>;

    /// Returns every trainable parameter, always in the same order.
    fn params_mut(&mut self) -> Vec<&mut Param>;

    /// Returns the weight tensors of the layers matching `selector`, in construction order.
    fn weights_mut(&mut self, selector: LayerSelector) -> Vec<&mut Param>;

    /// Returns the weight tensors of the layers matching `selector`, in construction order.
    fn weights(&self, selector: LayerSelector) -> Vec<&Param>;

    /// Resets the accumulated gradients.
    fn zero_grad(&mut self) {
        self.params_mut().into_iter().for_each(Param::zero_grad);
    }
}
