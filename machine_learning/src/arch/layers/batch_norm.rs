use ndarray::{Array1, Array4, ArrayD, Axis, Ix1, Ix4};

use crate::{MlErr, Result, arch::Param};

const EPS: f32 = 1e-5;
const MOMENTUM: f32 = 0.1;

/// Per channel batch normalization over `[N, C, H, W]` inputs.
///
/// Training passes normalize with the batch statistics and fold them into running estimates,
/// inference passes only read the running estimates.
#[derive(Debug, Clone)]
pub struct BatchNorm2d {
    channels: usize,
    weight: Param,
    bias: Param,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,

    // Forward metadata
    xhat: Option<Array4<f32>>,
    inv_std: Array1<f32>,
}

impl BatchNorm2d {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            weight: Param::filled(&[channels], 1.),
            bias: Param::filled(&[channels], 0.),
            running_mean: Array1::zeros(channels),
            running_var: Array1::ones(channels),
            xhat: None,
            inv_std: Array1::zeros(channels),
        }
    }

    pub fn size(&self) -> usize {
        2 * self.channels
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

    pub fn running_mean(&self) -> &Array1<f32> {
        &self.running_mean
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let mut x = self.check(x)?;
        let inv_std = self.running_var.mapv(|v| 1. / (v + EPS).sqrt());
        self.affine(&mut x, &self.running_mean, &inv_std)?;
        Ok(x.into_dyn())
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let mut x = self.check(x)?;
        let (n, _, h, w) = x.dim();
        let m = (n * h * w) as f32;

        let mut mean = Array1::zeros(self.channels);
        let mut var = Array1::zeros(self.channels);
        for (ci, xc) in x.axis_iter(Axis(1)).enumerate() {
            let mu = xc.sum() / m;
            mean[ci] = mu;
            var[ci] = xc.fold(0., |acc, v| acc + (v - mu).powi(2)) / m;
        }

        // Running variance tracks the unbiased estimate.
        let unbias = if m > 1. { m / (m - 1.) } else { 1. };
        self.running_mean
            .zip_mut_with(&mean, |r, &b| *r = (1. - MOMENTUM) * *r + MOMENTUM * b);
        self.running_var
            .zip_mut_with(&var, |r, &b| *r = (1. - MOMENTUM) * *r + MOMENTUM * b * unbias);

        self.inv_std = var.mapv(|v| 1. / (v + EPS).sqrt());

        let mut xhat = x.clone();
        for (ci, mut xc) in xhat.axis_iter_mut(Axis(1)).enumerate() {
            let (mu, inv) = (mean[ci], self.inv_std[ci]);
            xc.mapv_inplace(|v| (v - mu) * inv);
        }

        self.affine(&mut x, &mean, &self.inv_std)?;
        self.xhat = Some(xhat);
        Ok(x.into_dyn())
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let xhat = self
            .xhat
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "batch_norm2d" })?;

        let d = d.into_dimensionality::<Ix4>()?;
        let (n, _, h, w) = d.dim();
        let m = (n * h * w) as f32;

        let gamma = self.weight.value().view().into_dimensionality::<Ix1>()?;
        let mut dgamma = Array1::zeros(self.channels);
        let mut dbeta = Array1::zeros(self.channels);
        let mut dx = Array4::zeros(d.raw_dim());

        for ci in 0..self.channels {
            let dc = d.index_axis(Axis(1), ci);
            let xc = xhat.index_axis(Axis(1), ci);

            let sum_d = dc.sum();
            let sum_dx = (&dc * &xc).sum();
            dgamma[ci] = sum_dx;
            dbeta[ci] = sum_d;

            let scale = gamma[ci] * self.inv_std[ci] / m;
            let dxc = (&dc * m - sum_d - &xc * sum_dx) * scale;
            dx.index_axis_mut(Axis(1), ci).assign(&dxc);
        }

        *self.weight.grad_mut() += &dgamma.into_dyn();
        *self.bias.grad_mut() += &dbeta.into_dyn();
        Ok(dx.into_dyn())
    }

    fn check(&self, x: ArrayD<f32>) -> Result<Array4<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        if x.dim().1 != self.channels {
            return Err(MlErr::SizeMismatch {
                what: "batch_norm2d channels",
                got: x.dim().1,
                expected: self.channels,
            });
        }

        Ok(x)
    }

    /// Computes `gamma * (x - mean) * inv_std + beta` in place.
    fn affine(&self, x: &mut Array4<f32>, mean: &Array1<f32>, inv_std: &Array1<f32>) -> Result<()> {
        let gamma = self.weight.value().view().into_dimensionality::<Ix1>()?;
        let beta = self.bias.value().view().into_dimensionality::<Ix1>()?;

        for (ci, mut xc) in x.axis_iter_mut(Axis(1)).enumerate() {
            let (mu, inv, g, b) = (mean[ci], inv_std[ci], gamma[ci], beta[ci]);
            xc.mapv_inplace(|v| g * (v - mu) * inv + b);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn input() -> ArrayD<f32> {
        Array::from_shape_fn((4, 2, 3, 3), |(n, c, i, j)| {
            (n as f32 * 1.3 + c as f32 * 4. + i as f32 * 0.7 - j as f32 * 0.2).sin() * (c + 1) as f32
        })
        .into_dyn()
    }

    #[test]
    fn training_output_is_normalized() {
        let mut bn = BatchNorm2d::new(2);
        let y = bn.forward(input()).unwrap();

        for yc in y.axis_iter(Axis(1)) {
            let mean = yc.mean().unwrap();
            let var = yc.mapv(|v| (v - mean).powi(2)).mean().unwrap();
            assert!(mean.abs() < 1e-4);
            assert!((var - 1.).abs() < 1e-2);
        }
    }

    #[test]
    fn inference_uses_running_statistics() {
        let bn = BatchNorm2d::new(2);
        let x = input();
        // Fresh running stats are mean 0, var 1, so inference is almost the identity.
        let y = bn.infer(x.clone()).unwrap();
        assert!(y.iter().zip(x.iter()).all(|(a, b)| (a - b).abs() < 1e-4));
    }

    #[test]
    fn forward_updates_running_mean() {
        let mut bn = BatchNorm2d::new(2);
        bn.forward(input() + 10.).unwrap();
        assert!(bn.running_mean().iter().all(|m| *m > 0.5));
    }

    #[test]
    fn input_gradient_matches_finite_differences() {
        let mut bn = BatchNorm2d::new(2);
        bn.weight_mut().value_mut().fill(1.5);
        let x = input();
        // Weighted sum so the loss is not invariant to the normalization.
        let weights = Array::from_shape_fn(x.raw_dim(), |idx| (idx[0] + 2 * idx[2] + idx[3]) as f32 * 0.1);
        let loss = |bn: &mut BatchNorm2d, x: ArrayD<f32>| (bn.forward(x).unwrap() * &weights).sum();

        bn.forward(x.clone()).unwrap();
        let dx = bn.backward(weights.clone()).unwrap();

        let eps = 1e-2;
        for flat in [0usize, 13, 40, 71] {
            let mut plus = x.clone();
            plus.as_slice_mut().unwrap()[flat] += eps;
            let mut minus = x.clone();
            minus.as_slice_mut().unwrap()[flat] -= eps;

            let numeric = (loss(&mut bn.clone(), plus) - loss(&mut bn.clone(), minus)) / (2. * eps);
            let got = dx.as_slice().unwrap()[flat];
            assert!((numeric - got).abs() < 2e-2, "{flat}: {numeric} vs {got}");
        }
    }
}
