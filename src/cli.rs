use std::{num::NonZeroUsize, path::PathBuf};

use clap::{Parser, ValueEnum};
use machine_learning::{
    arch::{ModelKind, loss::LossKind},
    device::Device,
    optimization::OptimizerConfig,
};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "prune-sweep")]
#[command(about = "Train a CIFAR-10 classifier, then measure its accuracy under weight pruning")]
#[command(after_help = "Optimizer arguments (--lr, --momentum, --weight-decay, --beta1, --beta2, --eps) go last")]
pub struct Cli {
    /// Architecture to train: resnet18, resnet18_s, vgg16 or vgg16_s
    #[arg(long, default_value = "resnet18")]
    pub model: ModelKind,

    /// Optimizer to train with
    #[arg(long, value_enum)]
    pub optim: Optim,

    /// Loss to train with: cross_entropy or mse
    #[arg(long, default_value = "cross_entropy")]
    pub loss: LossKind,

    /// Seed of the initialization, shuffling and augmentation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    /// Directory holding `cifar-10-batches-bin`
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = DatasetSource::Cifar10)]
    pub dataset: DatasetSource,

    #[arg(long, default_value = "8")]
    pub batch_size: NonZeroUsize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Worker threads of the parallel device, one per core if not given
    #[arg(long)]
    pub threads: Option<NonZeroUsize>,

    /// Epochs after which the learning rate is divided by ten
    #[arg(long, value_delimiter = ',', default_value = "100,150")]
    pub milestones: Vec<usize>,

    /// Amount of pruning intensities, evenly spaced from 0 to 1
    #[arg(long, default_value_t = 21)]
    pub steps: usize,

    /// Run the trials of each policy concurrently
    #[arg(long)]
    pub parallel_sweep: bool,

    /// Arguments of the chosen optimizer
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub optim_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Optim {
    Sgd,
    #[value(name = "sgd_momentum")]
    SgdMomentum,
    Adam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    Cifar10,
    /// A small generated dataset, for smoke runs without the CIFAR-10 files
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Cpu,
    Parallel,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "sgd")]
struct SgdArgs {
    #[arg(long, default_value_t = 0.1)]
    lr: f32,
    #[arg(long, default_value_t = 0.)]
    weight_decay: f32,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "sgd_momentum")]
struct SgdMomentumArgs {
    #[arg(long, default_value_t = 0.1)]
    lr: f32,
    #[arg(long, default_value_t = 0.9)]
    momentum: f32,
    #[arg(long, default_value_t = 5e-4)]
    weight_decay: f32,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "adam")]
struct AdamArgs {
    #[arg(long, default_value_t = 1e-3)]
    lr: f32,
    #[arg(long, default_value_t = 0.9)]
    beta1: f32,
    #[arg(long, default_value_t = 0.999)]
    beta2: f32,
    #[arg(long, default_value_t = 1e-8)]
    eps: f32,
    #[arg(long, default_value_t = 0.)]
    weight_decay: f32,
}

impl Cli {
    /// Parses the trailing arguments for the chosen optimizer.
    pub fn optimizer(&self) -> Result<OptimizerConfig, clap::Error> {
        let args = &self.optim_args;

        let config = match self.optim {
            Optim::Sgd => {
                let SgdArgs { lr, weight_decay } = SgdArgs::try_parse_from(args)?;
                OptimizerConfig::GradientDescent {
                    learning_rate: lr,
                    weight_decay,
                }
            }
            Optim::SgdMomentum => {
                let SgdMomentumArgs {
                    lr,
                    momentum,
                    weight_decay,
                } = SgdMomentumArgs::try_parse_from(args)?;
                OptimizerConfig::GradientDescentWithMomentum {
                    learning_rate: lr,
                    momentum,
                    weight_decay,
                }
            }
            Optim::Adam => {
                let AdamArgs {
                    lr,
                    beta1,
                    beta2,
                    eps,
                    weight_decay,
                } = AdamArgs::try_parse_from(args)?;
                OptimizerConfig::Adam {
                    learning_rate: lr,
                    beta1,
                    beta2,
                    epsilon: eps,
                    weight_decay,
                }
            }
        };

        Ok(config)
    }

    pub fn device(&self) -> Device {
        match self.device {
            DeviceArg::Cpu => Device::Cpu,
            DeviceArg::Parallel => Device::Parallel {
                threads: self.threads,
            },
        }
    }
}
