use serde::Serialize;

use super::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer};

/// The configuration of an `Optimizer`, as chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OptimizerConfig {
    GradientDescent {
        learning_rate: f32,
        weight_decay: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
        weight_decay: f32,
    },
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
        weight_decay: f32,
    },
}

impl OptimizerConfig {
    /// Builds a fresh optimizer with no accumulated state.
    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            Self::GradientDescent {
                learning_rate,
                weight_decay,
            } => Box::new(GradientDescent::new(learning_rate, weight_decay)),
            Self::GradientDescentWithMomentum {
                learning_rate,
                momentum,
                weight_decay,
            } => Box::new(GradientDescentWithMomentum::new(
                learning_rate,
                momentum,
                weight_decay,
            )),
            Self::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
                weight_decay,
            } => Box::new(Adam::new(
                learning_rate,
                beta1,
                beta2,
                epsilon,
                weight_decay,
            )),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        match *self {
            Self::GradientDescent { learning_rate, .. }
            | Self::GradientDescentWithMomentum { learning_rate, .. }
            | Self::Adam { learning_rate, .. } => learning_rate,
        }
    }

    /// A short name identifying the optimizer and its hyperparameters, used in run names.
    pub fn run_name(&self) -> String {
        match *self {
            Self::GradientDescent {
                learning_rate,
                weight_decay,
            } => format!("sgd_lr{learning_rate}_wd{weight_decay}"),
            Self::GradientDescentWithMomentum {
                learning_rate,
                momentum,
                weight_decay,
            } => format!("sgd_momentum_lr{learning_rate}_m{momentum}_wd{weight_decay}"),
            Self::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
                weight_decay,
            } => format!("adam_lr{learning_rate}_b{beta1}_{beta2}_eps{epsilon}_wd{weight_decay}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_names() {
        let sgd = OptimizerConfig::GradientDescent {
            learning_rate: 0.1,
            weight_decay: 0.0005,
        };
        assert_eq!(sgd.run_name(), "sgd_lr0.1_wd0.0005");

        let momentum = OptimizerConfig::GradientDescentWithMomentum {
            learning_rate: 0.1,
            momentum: 0.9,
            weight_decay: 0.,
        };
        assert_eq!(momentum.run_name(), "sgd_momentum_lr0.1_m0.9_wd0");
    }

    #[test]
    fn built_optimizer_starts_at_configured_rate() {
        let adam = OptimizerConfig::Adam {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.,
        };
        assert_eq!(adam.build().learning_rate(), 0.001);
    }
}
