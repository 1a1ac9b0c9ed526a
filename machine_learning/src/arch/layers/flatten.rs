use ndarray::{ArrayD, IxDyn};

use crate::{MlErr, Result};

/// Collapses every dimension but the batch one, `[N, ...] -> [N, prod(...)]`.
#[derive(Debug, Clone, Default)]
pub struct Flatten {
    input_shape: Option<IxDyn>,
}

impl Flatten {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let n = x.shape().first().copied().unwrap_or(0);
        let features = x.len().checked_div(n).unwrap_or(0);
        Ok(standard(x).into_shape_with_order(IxDyn(&[n, features]))?)
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.input_shape = Some(x.raw_dim());
        self.infer(x)
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let shape = self
            .input_shape
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "flatten" })?;

        Ok(standard(d).into_shape_with_order(shape)?)
    }
}

fn standard(x: ArrayD<f32>) -> ArrayD<f32> {
    if x.is_standard_layout() {
        x
    } else {
        x.as_standard_layout().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_shape() {
        let mut flatten = Flatten::new();
        let y = flatten.forward(ArrayD::zeros(IxDyn(&[3, 4, 2, 2]))).unwrap();
        assert_eq!(y.shape(), &[3, 16]);

        let dx = flatten.backward(y).unwrap();
        assert_eq!(dx.shape(), &[3, 4, 2, 2]);
    }
}
