#![allow(dead_code)]

use std::{num::NonZeroUsize, sync::Arc};

use machine_learning::{
    arch::{
        Model, Param, Sequential,
        layers::{Conv2d, Layer, Window, conv_layers},
    },
    dataset::{DataLoader, ImageDataset, Transform, synthetic},
};
use ndarray::{Array4, ArrayD};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

pub const CLASSES: usize = 4;

/// A conv layer with the given `[out, in, k, k]` kernel and no bias.
pub fn conv(shape: [usize; 4], values: Vec<f32>) -> Layer {
    let weight = ArrayD::from_shape_vec(shape.to_vec(), values).unwrap();
    let k = shape[2];
    Layer::Conv2d(Conv2d::from_params(Param::new(weight), None, Window::new(k, 1, k / 2)))
}

/// `n` samples of a normal distribution with the given standard deviation.
pub fn normal(n: usize, std: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(0., std).unwrap();
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

/// A small convnet with random weights: two conv layers, the second inside a residual block,
/// and a dense head.
pub fn convnet(seed: u64) -> Sequential {
    let mut rng = StdRng::seed_from_u64(seed);

    Sequential::new([
        Layer::conv2d(&mut rng, 3, 4, Window::new(3, 1, 1), true).unwrap(),
        Layer::batch_norm2d(4),
        Layer::relu(),
        Layer::residual(
            vec![
                Layer::conv2d(&mut rng, 4, 4, Window::new(3, 1, 1), false).unwrap(),
                Layer::batch_norm2d(4),
            ],
            vec![],
        ),
        Layer::relu(),
        Layer::max_pool2d(2, 2),
        Layer::flatten(),
        Layer::dense(&mut rng, (4 * 4 * 4, CLASSES)).unwrap(),
    ])
}

/// Every weight tensor of the model, whatever its layer.
pub fn all_weights<M: Model>(model: &M) -> Vec<ArrayD<f32>> {
    model
        .weights(|_| true)
        .into_iter()
        .map(|p| p.value().clone())
        .collect()
}

/// Weights of the conv layers only.
pub fn conv_weights<M: Model>(model: &M) -> Vec<ArrayD<f32>> {
    model
        .weights(conv_layers)
        .into_iter()
        .map(|p| p.value().clone())
        .collect()
}

pub fn zeros(w: &ArrayD<f32>) -> usize {
    w.iter().filter(|v| **v == 0.).count()
}

/// A balanced held out split of the synthetic task, `8` images per class.
pub fn test_loader() -> DataLoader {
    let dataset = synthetic(CLASSES, 8 * CLASSES, (3, 8, 8), 11).unwrap();
    loader(dataset)
}

pub fn empty_loader() -> DataLoader {
    let dataset = ImageDataset::new(Array4::zeros((0, 3, 8, 8)), Vec::new(), CLASSES).unwrap();
    loader(dataset)
}

fn loader(dataset: ImageDataset) -> DataLoader {
    let batch_size = NonZeroUsize::new(8).unwrap();
    DataLoader::new(Arc::new(dataset), batch_size, false, Transform::identity())
}
