use std::{num::NonZeroUsize, path::PathBuf};

use machine_learning::{
    arch::{ModelKind, loss::LossKind},
    device::Device,
    optimization::OptimizerConfig,
    training::TrainerConfig,
};
use pruning::SweepConfig;
use serde::Serialize;

use crate::cli::{Cli, DatasetSource};

/// Everything a run depends on, resolved from the command line.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub model: ModelKind,
    pub optimizer: OptimizerConfig,
    pub loss: LossKind,
    pub dataset: DatasetSource,
    pub data_dir: PathBuf,
    pub batch_size: NonZeroUsize,
    pub device: Device,
    pub trainer: TrainerConfig,
    pub sweep: SweepConfig,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, clap::Error> {
        let trainer = TrainerConfig {
            epochs: cli.epochs,
            milestones: cli.milestones.clone(),
            seed: cli.seed,
            ..TrainerConfig::default()
        };

        let sweep = SweepConfig {
            steps: cli.steps,
            parallel: cli.parallel_sweep,
            ..SweepConfig::default()
        };

        Ok(Self {
            model: cli.model,
            optimizer: cli.optimizer()?,
            loss: cli.loss,
            dataset: cli.dataset,
            data_dir: cli.data_dir.clone(),
            batch_size: cli.batch_size,
            device: cli.device(),
            trainer,
            sweep,
        })
    }

    /// `{model}_cifar10_{optimizer}`.
    pub fn run_name(&self) -> String {
        format!("{}_cifar10_{}", self.model, self.optimizer.run_name())
    }
}
