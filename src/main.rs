mod cli;
mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use machine_learning::{
    dataset::{DataLoader, ImageDataset, Transform, cifar10, synthetic},
    device::ComputeContext,
    training::{Trainer, TrainingSummary},
};
use pruning::{ResultTable, default_policies, sweep};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::{
    cli::{Cli, DatasetSource},
    config::RunConfig,
};

/// Sizes of the generated splits used instead of CIFAR-10 with `--dataset synthetic`.
const SYNTHETIC_TRAIN: usize = 1000;
const SYNTHETIC_TEST: usize = 200;

#[derive(Debug, Serialize)]
struct RunReport {
    run_name: String,
    config: RunConfig,
    training: TrainingSummary,
    pruning: ResultTable,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = RunConfig::from_cli(&cli).unwrap_or_else(|e| e.exit());

    let report = run(config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn run(config: RunConfig) -> anyhow::Result<RunReport> {
    let run_name = config.run_name();
    info!("starting run {run_name}");

    let ctx = ComputeContext::new(config.device);
    let (train_set, test_set) = load_datasets(&config)?;
    let classes = train_set.classes();

    let train = DataLoader::new(
        Arc::new(train_set),
        config.batch_size,
        true,
        Transform::cifar10_train(),
    );
    let test = DataLoader::new(
        Arc::new(test_set),
        config.batch_size,
        false,
        Transform::cifar10_test(),
    );

    let mut rng = StdRng::seed_from_u64(config.trainer.seed);
    let mut model = config
        .model
        .build(&mut rng, classes)
        .with_context(|| format!("failed to build {}", config.model))?;

    let mut trainer = Trainer::new(
        config.trainer.clone(),
        config.optimizer.build(),
        config.loss.build(),
    );
    let training = ctx
        .install(|| trainer.fit(&mut model, &train, &test))
        .context("training failed")?;

    let policies = default_policies();
    let pruning = ctx
        .install(|| sweep(&model, &policies, &test, &config.sweep))
        .context("pruning sweep failed")?;

    info!("run {run_name} done");

    Ok(RunReport {
        run_name,
        config,
        training,
        pruning,
    })
}

fn load_datasets(config: &RunConfig) -> anyhow::Result<(ImageDataset, ImageDataset)> {
    match config.dataset {
        DatasetSource::Cifar10 => cifar10::load(&config.data_dir).with_context(|| {
            format!("failed to load CIFAR-10 from {}", config.data_dir.display())
        }),
        DatasetSource::Synthetic => {
            let dim = (cifar10::CHANNELS, cifar10::SIDE, cifar10::SIDE);
            let seed = config.trainer.seed;

            let train = synthetic(cifar10::CLASSES, SYNTHETIC_TRAIN, dim, seed)?;
            let test = synthetic(cifar10::CLASSES, SYNTHETIC_TEST, dim, seed.wrapping_add(1))?;
            Ok((train, test))
        }
    }
}
