use ndarray::{Array2, ArrayD, Ix2};

use super::{
    Model, Param,
    layers::{Layer, LayerSelector},
};
use crate::Result;

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers. Residual layers nest further branches, making the
/// whole model a DAG traversed depth first in construction order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Returns the top level layers.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns every layer of the graph, nested ones included, depth first.
    pub fn modules(&self) -> Vec<&Layer> {
        let mut modules = Vec::new();
        for layer in &self.layers {
            layer.visit(&mut |l| modules.push(l));
        }

        modules
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(Layer::size).sum()
    }

    fn infer(&self, x: ArrayD<f32>) -> Result<Array2<f32>> {
        let y = self.layers.iter().try_fold(x, |x, layer| layer.infer(x))?;
        Ok(y.into_dimensionality::<Ix2>()?)
    }

    fn forward(&mut self, x: ArrayD<f32>) -> Result<Array2<f32>> {
        let y = self
            .layers
            .iter_mut()
            .try_fold(x, |x, layer| layer.forward(x))?;
        Ok(y.into_dimensionality::<Ix2>()?)
    }

    fn backward(&mut self, d: Array2<f32>) -> Result<()> {
        self.layers
            .iter_mut()
            .rev()
            .try_fold(d.into_dyn(), |d, layer| layer.backward(d))?;
        Ok(())
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut params = Vec::new();
        for layer in self.layers.iter_mut() {
            layer.collect_params_mut(&mut params);
        }

        params
    }

    fn weights_mut(&mut self, selector: LayerSelector) -> Vec<&mut Param> {
        let mut weights = Vec::new();
        for layer in self.layers.iter_mut() {
            layer.collect_weights_mut(selector, &mut weights);
        }

        weights
    }

    fn weights(&self, selector: LayerSelector) -> Vec<&Param> {
        self.modules()
            .into_iter()
            .filter(|layer| selector(layer.kind()))
            .filter_map(Layer::weight)
            .collect()
    }
}
