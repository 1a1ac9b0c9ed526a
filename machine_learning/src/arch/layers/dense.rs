use ndarray::{Array2, ArrayD, ArrayView1, ArrayView2, Axis, Ix1, Ix2, linalg};
use rand::Rng;

use crate::{
    MlErr, Result,
    arch::{Param, init},
};

/// A fully connected layer computing `x . W + b`, with `W` shaped `[in, out]`.
///
/// Optimizations:
///   1. Find a way to not copy `x` in each `Dense::forward` call.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    weight: Param,
    bias: Param,

    // Forward metadata
    x: Option<Array2<f32>>,
}

impl Dense {
    /// Creates a new `Dense` layer with kaiming uniform parameters.
    ///
    /// # Arguments
    /// * `rng` - The random number generator used to initialize the parameters.
    /// * `dim` - The (input, output) sizes.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, dim: (usize, usize)) -> Result<Self> {
        let weight = init::kaiming_uniform(rng, &[dim.0, dim.1], dim.0)?;
        let bias = init::kaiming_uniform(rng, &[dim.1], dim.0)?;

        Ok(Self {
            dim,
            weight,
            bias,
            x: None,
        })
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    pub fn weight(&self) -> &Param {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Param {
        &mut self.weight
    }

    pub fn params_mut(&mut self) -> impl Iterator<Item = &mut Param> {
        [&mut self.weight, &mut self.bias].into_iter()
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix2>()?;
        Ok(self.affine(x.view())?.into_dyn())
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix2>()?;
        let z = self.affine(x.view())?;
        self.x = Some(x);
        Ok(z.into_dyn())
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = self
            .x
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "dense" })?;

        let d = d.into_dimensionality::<Ix2>()?;

        {
            let mut dw = self.weight.grad_mut().view_mut().into_dimensionality::<Ix2>()?;
            linalg::general_mat_mul(1., &x.t(), &d, 1., &mut dw);

            let mut db = self.bias.grad_mut().view_mut().into_dimensionality::<Ix1>()?;
            db += &d.sum_axis(Axis(0));
        }

        let (w, _) = self.view_params()?;
        let mut dx = Array2::zeros((d.nrows(), self.dim.0));
        linalg::general_mat_mul(1., &d, &w.t(), 0., &mut dx);

        Ok(dx.into_dyn())
    }

    fn affine(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense input features",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params()?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1., &x, &w, 0., &mut z);
        z += &b;
        Ok(z)
    }

    /// Gives a view of the parameters as the weights and biases of this layer.
    fn view_params(&self) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
        let weights = self.weight.value().view().into_dimensionality::<Ix2>()?;
        let biases = self.bias.value().view().into_dimensionality::<Ix1>()?;
        Ok((weights, biases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn output_shape_and_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let dense = Dense::new(&mut rng, (4, 3)).unwrap();
        let y = dense.infer(ArrayD::ones(IxDyn(&[5, 4]))).unwrap();

        assert_eq!(y.shape(), &[5, 3]);
        assert_eq!(dense.size(), 15);
    }

    #[test]
    fn gradients_of_a_linear_sum() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dense = Dense::new(&mut rng, (2, 2)).unwrap();
        let x = Array::from_shape_vec((2, 2), vec![1., 2., 3., 4.]).unwrap().into_dyn();

        dense.forward(x).unwrap();
        let dx = dense.backward(ArrayD::ones(IxDyn(&[2, 2]))).unwrap();

        // d(sum)/dW[i][j] = sum over rows of x[:, i].
        let dw = dense.weight().grad();
        assert_eq!(dw.as_slice().unwrap(), &[4., 4., 6., 6.]);

        // d(sum)/dx[r][i] = sum over j of W[i][j].
        let w = dense.weight().value();
        let row: Vec<f32> = (0..2).map(|i| w[[i, 0]] + w[[i, 1]]).collect();
        for r in 0..2 {
            for (i, expected) in row.iter().enumerate() {
                assert_eq!(dx[[r, i]], *expected);
            }
        }
    }
}
