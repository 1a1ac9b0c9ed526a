use super::{
    Optimizer,
    optimizer::{check_sizes, slot_state},
};
use crate::Result;

#[derive(Debug)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    weight_decay: f32,
    velocity: Vec<Box<[f32]>>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - Hyperparameter to the optimization algorithm.
    /// * `weight_decay` - L2 penalty added to the gradient.
    ///
    /// # Returns
    /// A new `GradientDescentWithMomentum` instance.
    pub fn new(learning_rate: f32, momentum: f32, weight_decay: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            weight_decay,
            velocity: Vec::new(),
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, slot: usize, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;

        let lr = self.learning_rate;
        let mu = self.momentum;
        let wd = self.weight_decay;
        let velocity = slot_state(&mut self.velocity, slot, params.len())?;

        params
            .iter_mut()
            .zip(grad)
            .zip(velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = (mu * *v) + g + wd * *p;
                *p -= lr * *v;
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
    fn velocity_accumulates_per_slot() {
        let mut optimizer = GradientDescentWithMomentum::new(1., 0.5, 0.);
        let mut a = [0.];
        let mut b = [0., 0.];

        optimizer.update_params(0, &[1.], &mut a).unwrap();
        optimizer.update_params(1, &[1., 1.], &mut b).unwrap();
        optimizer.update_params(0, &[1.], &mut a).unwrap();

        // v = 1, then v = 0.5 + 1.
        assert_eq!(a, [-2.5]);
        assert_eq!(b, [-1., -1.]);
    }

    #[test]
    fn slot_size_must_not_change() {
        let mut optimizer = GradientDescentWithMomentum::new(1., 0.5, 0.);
        optimizer.update_params(0, &[1.], &mut [0.]).unwrap();
        assert!(optimizer.update_params(0, &[1., 1.], &mut [0., 0.]).is_err());
    }
}
