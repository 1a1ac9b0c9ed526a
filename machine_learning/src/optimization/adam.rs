use super::{
    Optimizer,
    optimizer::{check_sizes, slot_state},
};
use crate::Result;

#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    steps: Vec<i32>,
    v: Vec<Box<[f32]>>,
    s: Vec<Box<[f32]>>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
    /// * `weight_decay` - L2 penalty added to the gradient.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            weight_decay,
            steps: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
        }
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, slot: usize, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            weight_decay: wd,
            ..
        } = *self;

        if self.steps.len() <= slot {
            self.steps.resize(slot + 1, 0);
        }
        self.steps[slot] += 1;
        let t = self.steps[slot];

        let bc1 = 1. - b1.powi(t);
        let bc2 = 1. - b2.powi(t);
        let step_size = lr * (bc2.sqrt() / bc1);

        let v = slot_state(&mut self.v, slot, params.len())?;
        let s = slot_state(&mut self.s, slot, params.len())?;

        params
            .iter_mut()
            .zip(grad)
            .zip(v.iter_mut())
            .zip(s.iter_mut())
            .for_each(|(((p, g), v), s)| {
                let g = g + wd * *p;
                *v = b1 * *v + (1. - b1) * g;
                *s = b2 * *s + (1. - b2) * g.powi(2);
                *p -= step_size * *v / (s.sqrt() + eps);
            });

        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_is_about_learning_rate() {
        let mut optimizer = Adam::new(0.1, 0.9, 0.999, 1e-8, 0.);
        let mut params = [1., 1.];
        optimizer.update_params(0, &[3., -0.01], &mut params).unwrap();

        // Bias corrected first step moves every coordinate by roughly `lr` regardless of scale.
        assert!((params[0] - 0.9).abs() < 1e-3);
        assert!((params[1] - 1.1).abs() < 1e-3);
    }
}
