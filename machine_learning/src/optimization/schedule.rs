use super::Optimizer;

/// Decays the learning rate of an optimizer by `gamma` once the epoch count reaches each milestone.
///
/// Stepped once per epoch; after `e` steps the rate is `base * gamma^k`, where `k` is the
/// number of milestones `<= e`.
#[derive(Debug, Clone)]
pub struct MultiStepLr {
    base: f32,
    milestones: Vec<usize>,
    gamma: f32,
    epoch: usize,
}

impl MultiStepLr {
    /// Creates a new `MultiStepLr`.
    ///
    /// # Arguments
    /// * `base` - The initial learning rate.
    /// * `milestones` - Epochs at which the rate is decayed, in any order.
    /// * `gamma` - The multiplicative decay factor.
    pub fn new(base: f32, mut milestones: Vec<usize>, gamma: f32) -> Self {
        milestones.sort_unstable();

        Self {
            base,
            milestones,
            gamma,
            epoch: 0,
        }
    }

    /// The learning rate for the current epoch.
    pub fn learning_rate(&self) -> f32 {
        let passed = self.milestones.iter().filter(|&&m| m <= self.epoch).count();
        self.base * self.gamma.powi(passed as i32)
    }

    /// Advances one epoch and writes the resulting learning rate into `optimizer`.
    pub fn step(&mut self, optimizer: &mut dyn Optimizer) {
        self.epoch += 1;
        optimizer.set_learning_rate(self.learning_rate());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::GradientDescent;

    #[test]
    fn decays_at_milestones() {
        let mut optimizer = GradientDescent::new(1., 0.);
        let mut schedule = MultiStepLr::new(1., vec![3, 2], 0.1);

        let mut rates = Vec::new();
        for _ in 0..4 {
            schedule.step(&mut optimizer);
            rates.push(optimizer.learning_rate());
        }

        let expected = [1., 0.1, 0.01, 0.01];
        for (got, want) in rates.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{rates:?}");
        }
    }
}
