use log::{Level, debug, info, log_enabled};
use machine_learning::{
    arch::{
        Model,
        layers::{LayerSelector, conv_layers},
    },
    dataset::DataLoader,
    training::evaluate,
};
use rayon::prelude::*;
use serde::Serialize;

use crate::{PruneErr, PruningPolicy, ResultTable, Result, Sparsity, Trial, prune};

/// How a pruning sweep runs.
#[derive(Debug, Clone, Serialize)]
pub struct SweepConfig {
    /// The amount of evenly spaced intensities from 0 to 1, both included.
    pub steps: usize,
    #[serde(skip)]
    pub selector: LayerSelector,
    /// Whether the trials of a policy run concurrently.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            steps: 21,
            selector: conv_layers,
            parallel: false,
        }
    }
}

/// Returns `steps` evenly spaced values from 0 to 1, both included.
pub fn intensity_grid(steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.],
        _ => {
            let last = (steps - 1) as f64;
            (0..steps).map(|i| i as f64 / last).collect()
        }
    }
}

/// Measures the accuracy of `model` pruned by every policy at every intensity of the grid.
///
/// Every trial prunes its own clone of `model`, which is never mutated. The trials are
/// independent, so with `config.parallel` they run concurrently; the results keep grid order
/// regardless.
///
/// # Arguments
/// * `model` - The trained model.
/// * `policies` - The policies to compare.
/// * `test` - The held out split the pruned models are evaluated on.
/// * `config` - The grid and the layers to prune.
///
/// # Returns
/// The accuracy curve of every policy, or the error of the first failing trial.
pub fn sweep<M: Model>(
    model: &M,
    policies: &[Box<dyn PruningPolicy>],
    test: &DataLoader,
    config: &SweepConfig,
) -> Result<ResultTable> {
    let grid = intensity_grid(config.steps);
    let mut curves = Vec::with_capacity(policies.len());

    for policy in policies {
        let policy = policy.as_ref();
        info!("sweeping {}", policy.name());

        let run = |&intensity: &f64| trial(model, policy, intensity, test, config.selector);
        let trials = if config.parallel {
            grid.par_iter().map(run).collect::<Result<Vec<_>>>()?
        } else {
            grid.iter().map(run).collect::<Result<Vec<_>>>()?
        };

        curves.push((policy.name(), trials));
    }

    Ok(ResultTable::new(curves))
}

fn trial<M: Model>(
    model: &M,
    policy: &dyn PruningPolicy,
    intensity: f64,
    test: &DataLoader,
    selector: LayerSelector,
) -> Result<Trial> {
    let run = || -> Result<Trial> {
        let pruned = prune(policy, model.clone(), intensity, selector)?;
        if log_enabled!(Level::Debug) {
            debug!(
                "{} at {intensity:.2}: {:.4} of the weights are zero",
                policy.name(),
                Sparsity::of(&pruned, selector).pooled()
            );
        }

        let accuracy = evaluate(&pruned, test)?;
        Ok(Trial {
            intensity,
            accuracy,
        })
    };

    let recorded = run().map_err(|e| PruneErr::TrialFailed {
        policy: policy.name(),
        intensity,
        source: Box::new(e),
    })?;

    info!(
        policy = policy.name(), intensity = intensity, accuracy = recorded.accuracy;
        "{} {intensity:.2}: {:.2}%",
        policy.name(),
        recorded.accuracy
    );

    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_steps_by_five_hundredths() {
        let grid = intensity_grid(21);

        assert_eq!(grid.len(), 21);
        assert_eq!(grid[0], 0.);
        assert_eq!(grid[20], 1.);
        for (i, a) in grid.iter().enumerate() {
            assert!((a - 0.05 * i as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn degenerate_grids() {
        assert!(intensity_grid(0).is_empty());
        assert_eq!(intensity_grid(1), [0.]);
        assert_eq!(intensity_grid(2), [0., 1.]);
    }
}
