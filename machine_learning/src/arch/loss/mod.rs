mod cross_entropy;
mod kind;
mod loss_fn;
mod mse;

pub use cross_entropy::{CrossEntropy, softmax};
pub use kind::LossKind;
pub use loss_fn::LossFn;
pub use mse::Mse;

use ndarray::Array2;

/// Encodes `labels` as rows of a `[labels.len(), classes]` indicator matrix.
pub(crate) fn one_hot(labels: &[usize], classes: usize) -> Array2<f32> {
    let mut y = Array2::zeros((labels.len(), classes));
    for (i, &label) in labels.iter().enumerate() {
        if label < classes {
            y[[i, label]] = 1.;
        }
    }

    y
}
