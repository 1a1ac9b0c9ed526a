use ndarray::ArrayD;

use super::Layer;
use crate::{MlErr, Result};

/// Two branches over the same input whose outputs are added, `main(x) + shortcut(x)`.
/// An empty shortcut is the identity.
#[derive(Debug, Clone)]
pub struct Residual {
    main: Vec<Layer>,
    shortcut: Vec<Layer>,
}

impl Residual {
    pub fn new(main: Vec<Layer>, shortcut: Vec<Layer>) -> Self {
        Self { main, shortcut }
    }

    pub fn size(&self) -> usize {
        self.layers().map(Layer::size).sum()
    }

    /// Iterates the direct children, main branch first.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.main.iter().chain(&self.shortcut)
    }

    pub fn layers_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.main.iter_mut().chain(&mut self.shortcut)
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let shortcut = self
            .shortcut
            .iter()
            .try_fold(x.clone(), |x, layer| layer.infer(x))?;
        let main = self.main.iter().try_fold(x, |x, layer| layer.infer(x))?;
        merge(main, shortcut)
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let shortcut = self
            .shortcut
            .iter_mut()
            .try_fold(x.clone(), |x, layer| layer.forward(x))?;
        let main = self
            .main
            .iter_mut()
            .try_fold(x, |x, layer| layer.forward(x))?;
        merge(main, shortcut)
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let shortcut = self
            .shortcut
            .iter_mut()
            .rev()
            .try_fold(d.clone(), |d, layer| layer.backward(d))?;
        let main = self
            .main
            .iter_mut()
            .rev()
            .try_fold(d, |d, layer| layer.backward(d))?;
        merge(main, shortcut)
    }
}

fn merge(mut a: ArrayD<f32>, b: ArrayD<f32>) -> Result<ArrayD<f32>> {
    if a.shape() != b.shape() {
        return Err(MlErr::SizeMismatch {
            what: "residual branches",
            got: b.len(),
            expected: a.len(),
        });
    }

    a += &b;
    Ok(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn identity_shortcut_doubles_relu_of_positive_input() {
        let mut block = Residual::new(vec![Layer::relu()], vec![]);
        let x = ArrayD::from_elem(IxDyn(&[1, 2]), 3.);
        let y = block.forward(x).unwrap();
        assert!(y.iter().all(|v| *v == 6.));

        let dx = block.backward(ArrayD::ones(IxDyn(&[1, 2]))).unwrap();
        assert!(dx.iter().all(|v| *v == 2.));
    }

    #[test]
    fn branch_shape_mismatch_is_an_error() {
        let block = Residual::new(vec![Layer::flatten()], vec![]);
        let x = ArrayD::zeros(IxDyn(&[1, 2, 2, 2]));
        assert!(matches!(block.infer(x), Err(MlErr::SizeMismatch { .. })));
    }
}
