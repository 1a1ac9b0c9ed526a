use ndarray::ArrayD;
use rand::Rng;
use serde::Serialize;

use super::{BatchNorm2d, Conv2d, Dense, Flatten, GlobalAvgPool, MaxPool2d, Relu, Residual, Window};
use crate::{Result, arch::Param};

/// Capability tag of a layer, used to pick layers out of a model without matching on the
/// concrete layer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Conv2d,
    BatchNorm2d,
    Relu,
    MaxPool2d,
    GlobalAvgPool,
    Flatten,
    Dense,
    Residual,
}

/// Predicate selecting the layers an operation applies to.
pub type LayerSelector = fn(LayerKind) -> bool;

/// Selects convolutional layers only.
pub fn conv_layers(kind: LayerKind) -> bool {
    kind == LayerKind::Conv2d
}

#[derive(Debug, Clone)]
pub enum Layer {
    Conv2d(Conv2d),
    BatchNorm2d(BatchNorm2d),
    Relu(Relu),
    MaxPool2d(MaxPool2d),
    GlobalAvgPool(GlobalAvgPool),
    Flatten(Flatten),
    Dense(Dense),
    Residual(Residual),
}
use Layer::*;

impl Layer {
    pub fn conv2d<R: Rng + ?Sized>(
        rng: &mut R,
        in_channels: usize,
        out_channels: usize,
        window: Window,
        bias: bool,
    ) -> Result<Self> {
        Conv2d::new(rng, in_channels, out_channels, window, bias).map(Self::Conv2d)
    }

    pub fn batch_norm2d(channels: usize) -> Self {
        Self::BatchNorm2d(BatchNorm2d::new(channels))
    }

    pub fn relu() -> Self {
        Self::Relu(Relu::new())
    }

    pub fn max_pool2d(kernel: usize, stride: usize) -> Self {
        Self::MaxPool2d(MaxPool2d::new(kernel, stride))
    }

    pub fn global_avg_pool() -> Self {
        Self::GlobalAvgPool(GlobalAvgPool::new())
    }

    pub fn flatten() -> Self {
        Self::Flatten(Flatten::new())
    }

    pub fn dense<R: Rng + ?Sized>(rng: &mut R, dim: (usize, usize)) -> Result<Self> {
        Dense::new(rng, dim).map(Self::Dense)
    }

    pub fn residual(main: Vec<Layer>, shortcut: Vec<Layer>) -> Self {
        Self::Residual(Residual::new(main, shortcut))
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            Conv2d(_) => LayerKind::Conv2d,
            BatchNorm2d(_) => LayerKind::BatchNorm2d,
            Relu(_) => LayerKind::Relu,
            MaxPool2d(_) => LayerKind::MaxPool2d,
            GlobalAvgPool(_) => LayerKind::GlobalAvgPool,
            Flatten(_) => LayerKind::Flatten,
            Dense(_) => LayerKind::Dense,
            Residual(_) => LayerKind::Residual,
        }
    }

    /// Returns the amount of parameters in this layer, nested layers included.
    pub fn size(&self) -> usize {
        match self {
            Conv2d(l) => l.size(),
            BatchNorm2d(l) => l.size(),
            Dense(l) => l.size(),
            Residual(l) => l.size(),
            Relu(_) | MaxPool2d(_) | GlobalAvgPool(_) | Flatten(_) => 0,
        }
    }

    /// Returns the weight tensor of this layer, if it owns one.
    pub fn weight(&self) -> Option<&Param> {
        match self {
            Conv2d(l) => Some(l.weight()),
            BatchNorm2d(l) => Some(l.weight()),
            Dense(l) => Some(l.weight()),
            _ => None,
        }
    }

    pub fn weight_mut(&mut self) -> Option<&mut Param> {
        match self {
            Conv2d(l) => Some(l.weight_mut()),
            BatchNorm2d(l) => Some(l.weight_mut()),
            Dense(l) => Some(l.weight_mut()),
            _ => None,
        }
    }

    /// Runs `f` on this layer and then on every nested layer, depth first.
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Layer),
    {
        f(self);
        if let Residual(block) = self {
            block.layers().for_each(|layer| layer.visit(f));
        }
    }

    /// Collects every trainable parameter in traversal order.
    pub fn collect_params_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Param>) {
        match self {
            Conv2d(l) => out.extend(l.params_mut()),
            BatchNorm2d(l) => out.extend(l.params_mut()),
            Dense(l) => out.extend(l.params_mut()),
            Residual(l) => l.layers_mut().for_each(|layer| layer.collect_params_mut(out)),
            Relu(_) | MaxPool2d(_) | GlobalAvgPool(_) | Flatten(_) => {}
        }
    }

    /// Collects the weight tensors of the layers matching `selector`, in traversal order.
    pub fn collect_weights_mut<'a>(
        &'a mut self,
        selector: LayerSelector,
        out: &mut Vec<&'a mut Param>,
    ) {
        if let Residual(block) = self {
            block
                .layers_mut()
                .for_each(|layer| layer.collect_weights_mut(selector, out));
            return;
        }

        if selector(self.kind()) {
            out.extend(self.weight_mut());
        }
    }

    /// Inference pass: training only behaviour is disabled and nothing is cached.
    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        match self {
            Conv2d(l) => l.infer(x),
            BatchNorm2d(l) => l.infer(x),
            Relu(l) => Ok(l.infer(x)),
            MaxPool2d(l) => l.infer(x),
            GlobalAvgPool(l) => l.infer(x),
            Flatten(l) => l.infer(x),
            Dense(l) => l.infer(x),
            Residual(l) => l.infer(x),
        }
    }

    /// Training pass: caches whatever `backward` needs.
    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        match self {
            Conv2d(l) => l.forward(x),
            BatchNorm2d(l) => l.forward(x),
            Relu(l) => Ok(l.forward(x)),
            MaxPool2d(l) => l.forward(x),
            GlobalAvgPool(l) => l.forward(x),
            Flatten(l) => l.forward(x),
            Dense(l) => l.forward(x),
            Residual(l) => l.forward(x),
        }
    }

    /// Accumulates the parameter gradients and returns the gradient w.r.t. the input.
    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        match self {
            Conv2d(l) => l.backward(d),
            BatchNorm2d(l) => l.backward(d),
            Relu(l) => l.backward(d),
            MaxPool2d(l) => l.backward(d),
            GlobalAvgPool(l) => l.backward(d),
            Flatten(l) => l.backward(d),
            Dense(l) => l.backward(d),
            Residual(l) => l.backward(d),
        }
    }
}
