use ndarray::{Array2, ArrayView2, Axis};

use super::{LossFn, one_hot};

/// Softmax followed by the negative log likelihood of the true class, averaged over the batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    pub fn new() -> Self {
        Self
    }
}

/// Row wise softmax, shifted by the row maximum for stability.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut p = logits.to_owned();
    for mut row in p.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }

    p
}

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, labels: &[usize]) -> f32 {
        if labels.is_empty() {
            return 0.;
        }

        let p = softmax(y_pred);
        let nll: f32 = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| -p[[i, label]].max(f32::MIN_POSITIVE).ln())
            .sum();

        nll / labels.len() as f32
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, labels: &[usize]) -> Array2<f32> {
        let n = labels.len().max(1) as f32;
        (softmax(y_pred) - one_hot(labels, y_pred.ncols())) / n
    }
}
