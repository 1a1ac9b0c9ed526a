use machine_learning::arch::{Model, layers::LayerSelector};
use serde::Serialize;

/// The amount of exactly zero entries of a weight tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerSparsity {
    pub zeros: usize,
    pub total: usize,
}

impl LayerSparsity {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.;
        }

        self.zeros as f64 / self.total as f64
    }
}

/// Per layer and pooled sparsity of the weights of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparsity {
    pub layers: Vec<LayerSparsity>,
}

impl Sparsity {
    /// Measures the weights of the layers of `model` matching `selector`, in construction order.
    pub fn of<M: Model>(model: &M, selector: LayerSelector) -> Self {
        let layers = model
            .weights(selector)
            .into_iter()
            .map(|w| LayerSparsity {
                zeros: w.len() - w.nonzero(),
                total: w.len(),
            })
            .collect();

        Self { layers }
    }

    /// The fraction of zeros among all the measured weights.
    pub fn pooled(&self) -> f64 {
        let zeros: usize = self.layers.iter().map(|l| l.zeros).sum();
        let total: usize = self.layers.iter().map(|l| l.total).sum();
        LayerSparsity { zeros, total }.fraction()
    }
}
