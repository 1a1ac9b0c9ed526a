#![cfg(test)]

use std::{num::NonZeroUsize, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    arch::{
        Model, Sequential,
        layers::{Layer, Window},
        loss::{CrossEntropy, LossKind},
    },
    dataset::{DataLoader, Transform, synthetic},
    optimization::GradientDescentWithMomentum,
    training::{Trainer, TrainerConfig, evaluate},
};

const CLASSES: usize = 4;

fn tiny_convnet(seed: u64) -> Sequential {
    let mut rng = StdRng::seed_from_u64(seed);

    Sequential::new([
        Layer::conv2d(&mut rng, 3, 4, Window::new(3, 1, 1), true).unwrap(),
        Layer::relu(),
        Layer::max_pool2d(2, 2),
        Layer::flatten(),
        Layer::dense(&mut rng, (4 * 4 * 4, CLASSES)).unwrap(),
    ])
}

fn loaders() -> (DataLoader, DataLoader) {
    let batch_size = NonZeroUsize::new(8).unwrap();
    let train = synthetic(CLASSES, 64, (3, 8, 8), 1).unwrap();
    let test = synthetic(CLASSES, 32, (3, 8, 8), 2).unwrap();

    (
        DataLoader::new(Arc::new(train), batch_size, true, Transform::identity()),
        DataLoader::new(Arc::new(test), batch_size, false, Transform::identity()),
    )
}

#[test]
fn test_tiny_convnet_learns_synthetic_task() {
    let (train, test) = loaders();
    let mut model = tiny_convnet(0);

    let config = TrainerConfig {
        epochs: 20,
        milestones: vec![15],
        gamma: 0.1,
        seed: 3,
    };
    let optimizer = GradientDescentWithMomentum::new(0.05, 0.9, 0.);
    let mut trainer = Trainer::new(config, Box::new(optimizer), CrossEntropy);

    let summary = trainer.fit(&mut model, &train, &test).unwrap();

    assert_eq!(summary.history.len(), 20);
    assert!(summary.history[15].learning_rate < summary.history[14].learning_rate);
    assert!(summary.max_test_accuracy >= 75., "{summary:?}");
    assert!(summary.history[19].train_loss < summary.history[0].train_loss);
}

#[test]
fn test_tiny_convnet_trains_with_mse() {
    let (train, test) = loaders();
    let mut model = tiny_convnet(2);

    let config = TrainerConfig {
        epochs: 10,
        milestones: vec![],
        gamma: 0.1,
        seed: 4,
    };
    let optimizer = GradientDescentWithMomentum::new(0.05, 0.9, 0.);
    let mut trainer = Trainer::new(config, Box::new(optimizer), LossKind::Mse.build());

    let summary = trainer.fit(&mut model, &train, &test).unwrap();

    assert_eq!(summary.history.len(), 10);
    assert!(summary.history.iter().all(|s| s.train_loss.is_finite()));
    assert!(summary.history[9].train_loss < summary.history[0].train_loss, "{summary:?}");
}

#[test]
fn test_evaluation_is_deterministic_and_read_only() {
    let (_, test) = loaders();
    let model = tiny_convnet(1);
    let before = model.clone();

    let first = evaluate(&model, &test).unwrap();
    let second = evaluate(&model, &test).unwrap();

    assert_eq!(first, second);
    assert!((0. ..=100.).contains(&first));

    let mut model = model;
    let mut before = before;
    for (a, b) in model.params_mut().into_iter().zip(before.params_mut()) {
        assert_eq!(a.value(), b.value());
    }
}
