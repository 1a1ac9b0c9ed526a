use serde::Serialize;

/// The metrics of a single training epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub train_accuracy: f64,
    /// Sum of the mean loss of every batch.
    pub train_loss: f32,
    pub test_accuracy: f64,
    pub learning_rate: f32,
}

/// The history of a training run and its best values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub history: Vec<EpochStats>,
    pub min_train_loss: f32,
    pub max_train_accuracy: f64,
    pub max_test_accuracy: f64,
}

impl TrainingSummary {
    pub fn new(history: Vec<EpochStats>) -> Self {
        let min_train_loss = history
            .iter()
            .map(|s| s.train_loss)
            .fold(f32::INFINITY, f32::min);

        let max_train_accuracy = history
            .iter()
            .map(|s| s.train_accuracy)
            .fold(0., f64::max);

        let max_test_accuracy = history
            .iter()
            .map(|s| s.test_accuracy)
            .fold(0., f64::max);

        Self {
            history,
            min_train_loss,
            max_train_accuracy,
            max_test_accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(epoch: usize, train_loss: f32, train_accuracy: f64, test_accuracy: f64) -> EpochStats {
        EpochStats {
            epoch,
            train_accuracy,
            train_loss,
            test_accuracy,
            learning_rate: 0.1,
        }
    }

    #[test]
    fn best_values_come_from_any_epoch() {
        let summary = TrainingSummary::new(vec![
            stats(0, 3., 40., 55.),
            stats(1, 1., 70., 50.),
            stats(2, 2., 60., 52.),
        ]);

        assert_eq!(summary.min_train_loss, 1.);
        assert_eq!(summary.max_train_accuracy, 70.);
        assert_eq!(summary.max_test_accuracy, 55.);
    }
}
