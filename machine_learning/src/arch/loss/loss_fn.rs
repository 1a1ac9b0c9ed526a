use ndarray::{Array2, ArrayView2};

/// A loss over a batch of output rows and their class labels.
pub trait LossFn {
    /// Returns the mean loss of the batch.
    fn loss(&self, y_pred: ArrayView2<f32>, labels: &[usize]) -> f32;

    /// Returns the gradient of `loss` w.r.t. `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, labels: &[usize]) -> Array2<f32>;
}

impl<L: LossFn + ?Sized> LossFn for Box<L> {
    fn loss(&self, y_pred: ArrayView2<f32>, labels: &[usize]) -> f32 {
        (**self).loss(y_pred, labels)
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, labels: &[usize]) -> Array2<f32> {
        (**self).loss_prime(y_pred, labels)
    }
}
