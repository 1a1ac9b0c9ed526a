use log::{info, trace};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

use super::{EpochStats, TrainingSummary, evaluate, evaluation::count_correct};
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::DataLoader,
    optimization::{self, MultiStepLr, Optimizer},
};

/// How a `Trainer` runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainerConfig {
    pub epochs: usize,
    /// Epochs after which the learning rate is multiplied by `gamma`.
    pub milestones: Vec<usize>,
    pub gamma: f32,
    /// Seeds the shuffling and augmentation of the training data.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            milestones: vec![100, 150],
            gamma: 0.1,
            seed: 42,
        }
    }
}

/// Trains a model with an optimizer, a loss function and a multi step learning rate schedule.
pub struct Trainer<L: LossFn> {
    config: TrainerConfig,
    optimizer: Box<dyn Optimizer>,
    schedule: MultiStepLr,
    loss_fn: L,
    rng: StdRng,
}

impl<L: LossFn> Trainer<L> {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `config` - The epochs, schedule and seed of the run.
    /// * `optimizer` - The optimizer, its current learning rate is the schedule's base rate.
    /// * `loss_fn` - The loss minimized during training.
    pub fn new(config: TrainerConfig, optimizer: Box<dyn Optimizer>, loss_fn: L) -> Self {
        let schedule = MultiStepLr::new(
            optimizer.learning_rate(),
            config.milestones.clone(),
            config.gamma,
        );
        let rng = StdRng::seed_from_u64(config.seed);

        Self {
            config,
            optimizer,
            schedule,
            loss_fn,
            rng,
        }
    }

    /// Runs every batch of `loader` through one optimization step.
    ///
    /// # Returns
    /// The running accuracy over the epoch, in percent, and the sum of the batch mean losses.
    pub fn train_epoch<M: Model>(&mut self, model: &mut M, loader: &DataLoader) -> Result<(f64, f32)> {
        let mut loss_sum = 0.;
        let mut correct = 0;
        let mut total = 0;

        for (i, batch) in loader.train_batches(&mut self.rng).enumerate() {
            model.zero_grad();

            let out = model.forward(batch.inputs.into_dyn())?;
            let batch_correct = count_correct(out.view(), &batch.labels)?;

            let loss = self.loss_fn.loss(out.view(), &batch.labels);
            let d = self.loss_fn.loss_prime(out.view(), &batch.labels);
            model.backward(d)?;
            optimization::step(self.optimizer.as_mut(), model.params_mut())?;

            trace!(batch = i, loss = loss; "batch done");

            loss_sum += loss;
            correct += batch_correct;
            total += batch.labels.len();
        }

        if total == 0 {
            return Err(MlErr::EmptyDataset);
        }

        Ok((100. * correct as f64 / total as f64, loss_sum))
    }

    /// Trains `model` for the configured amount of epochs, evaluating it on `test` after each.
    ///
    /// # Returns
    /// The per epoch history along with its best values.
    pub fn fit<M: Model>(
        &mut self,
        model: &mut M,
        train: &DataLoader,
        test: &DataLoader,
    ) -> Result<TrainingSummary> {
        info!("training {} parameters", model.size());

        let mut history = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            let learning_rate = self.optimizer.learning_rate();
            let (train_accuracy, train_loss) = self.train_epoch(model, train)?;
            info!("train acc {train_accuracy:.3}");
            info!("train loss {train_loss:.6}");

            let test_accuracy = evaluate(model, test)?;
            info!("test acc {test_accuracy:.3}");

            self.schedule.step(self.optimizer.as_mut());

            info!(
                epoch = epoch, lr = learning_rate;
                "epoch {epoch}: train loss {train_loss:.6}, train acc {train_accuracy:.3}, test acc {test_accuracy:.3}"
            );

            history.push(EpochStats {
                epoch,
                train_accuracy,
                train_loss,
                test_accuracy,
                learning_rate,
            });
        }

        let summary = TrainingSummary::new(history);
        info!(
            "best: train loss {:.6}, train acc {:.3}, test acc {:.3}",
            summary.min_train_loss, summary.max_train_accuracy, summary.max_test_accuracy
        );

        Ok(summary)
    }
}
