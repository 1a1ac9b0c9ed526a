use ndarray::{Array2, ArrayD, ArrayView4, Axis, Ix4, linalg};
use rand::Rng;

use super::im2col::{Window, col2im, im2col};
use crate::{
    MlErr, Result,
    arch::{Param, init},
};

/// 2D convolution over `[N, C, H, W]` inputs, lowered to a matrix product with `im2col`.
///
/// The weight is laid out `[out_channels, in_channels, kernel, kernel]`, so dimension 1 is the
/// input channel dimension.
#[derive(Debug, Clone)]
pub struct Conv2d {
    in_channels: usize,
    out_channels: usize,
    window: Window,
    weight: Param,
    bias: Option<Param>,

    // Forward metadata
    cols: Option<Array2<f32>>,
    input_dim: (usize, usize, usize, usize),
}

impl Conv2d {
    /// Creates a new `Conv2d` with kaiming uniform weights.
    ///
    /// # Arguments
    /// * `rng` - The random number generator used to initialize the parameters.
    /// * `in_channels` - The channels of the input.
    /// * `out_channels` - The channels this layer produces.
    /// * `window` - Kernel size, stride and zero padding.
    /// * `bias` - Whether to add a learnable bias per output channel.
    ///
    /// # Returns
    /// A new `Conv2d` instance or an error if the parameters could not be initialized.
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        in_channels: usize,
        out_channels: usize,
        window: Window,
        bias: bool,
    ) -> Result<Self> {
        let k = window.kernel;
        let fan_in = in_channels * k * k;
        let weight = init::kaiming_uniform(rng, &[out_channels, in_channels, k, k], fan_in)?;
        let bias = match bias {
            true => Some(init::kaiming_uniform(rng, &[out_channels], fan_in)?),
            false => None,
        };

        Ok(Self::from_params(weight, bias, window))
    }

    /// Creates a `Conv2d` from already built parameters, the channel counts are taken from the
    /// weight's shape.
    ///
    /// # Panics
    /// If `weight` is not four dimensional.
    pub fn from_params(weight: Param, bias: Option<Param>, window: Window) -> Self {
        assert_eq!(weight.shape().len(), 4, "conv weight must be [out, in, k, k]");
        let (out_channels, in_channels) = (weight.shape()[0], weight.shape()[1]);

        Self {
            in_channels,
            out_channels,
            window,
            weight,
            bias,
            cols: None,
            input_dim: (0, 0, 0, 0),
        }
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.weight.len() + self.bias.as_ref().map_or(0, Param::len)
    }

    pub fn weight(&self) -> &Param {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Param {
        &mut self.weight
    }

    pub fn params_mut(&mut self) -> impl Iterator<Item = &mut Param> {
        std::iter::once(&mut self.weight).chain(self.bias.as_mut())
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (y, _) = self.convolve(x.view())?;
        Ok(y)
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (y, cols) = self.convolve(x.view())?;

        self.cols = Some(cols);
        self.input_dim = x.dim();
        Ok(y)
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let cols = self
            .cols
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "conv2d" })?;

        let d = d.into_dimensionality::<Ix4>()?;
        let (n, o, ho, wo) = d.dim();
        let patch = self.in_channels * self.window.kernel.pow(2);

        // [N, O, Ho, Wo] -> [O, N * Ho * Wo], the column order produced by `im2col`.
        let d = d
            .permuted_axes([1, 0, 2, 3])
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order((o, n * ho * wo))?;

        {
            let mut dw = self
                .weight
                .grad_mut()
                .view_mut()
                .into_shape_with_order((o, patch))?;
            linalg::general_mat_mul(1., &d, &cols.t(), 1., &mut dw);
        }

        if let Some(bias) = self.bias.as_mut() {
            let mut db = bias.grad_mut().view_mut().into_shape_with_order(o)?;
            db += &d.sum_axis(Axis(1));
        }

        let w = self.weight.value().view().into_shape_with_order((o, patch))?;
        let mut dcols = Array2::zeros((patch, n * ho * wo));
        linalg::general_mat_mul(1., &w.t(), &d, 0., &mut dcols);

        let dx = col2im(dcols.view(), self.input_dim, self.window, (ho, wo));
        Ok(dx.into_dyn())
    }

    fn convolve(&self, x: ArrayView4<f32>) -> Result<(ArrayD<f32>, Array2<f32>)> {
        let (n, c, h, w) = x.dim();
        if c != self.in_channels {
            return Err(MlErr::SizeMismatch {
                what: "conv2d input channels",
                got: c,
                expected: self.in_channels,
            });
        }

        let (ho, wo) = self.window.output_hw(h, w).ok_or(MlErr::SizeMismatch {
            what: "conv2d input height",
            got: h,
            expected: self.window.kernel,
        })?;

        let o = self.out_channels;
        let cols = im2col(x, self.window, (ho, wo));
        let w = self
            .weight
            .value()
            .view()
            .into_shape_with_order((o, c * self.window.kernel.pow(2)))?;

        let mut y = Array2::zeros((o, n * ho * wo));
        linalg::general_mat_mul(1., &w, &cols, 0., &mut y);

        let mut y = y
            .into_shape_with_order((o, n, ho, wo))?
            .permuted_axes([1, 0, 2, 3]);

        if let Some(bias) = &self.bias {
            y += &bias.value().view().into_shape_with_order((1, o, 1, 1))?;
        }

        Ok((y.as_standard_layout().into_owned().into_dyn(), cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array4, IxDyn};
    use rand::{SeedableRng, rngs::StdRng};

    fn conv_with(weight: Vec<f32>, shape: [usize; 4], window: Window) -> Conv2d {
        let weight = Array::from_shape_vec(IxDyn(&shape), weight).unwrap();
        Conv2d::from_params(Param::new(weight), None, window)
    }

    #[test]
    fn identity_kernel_copies_input() {
        let conv = conv_with(vec![1.], [1, 1, 1, 1], Window::new(1, 1, 0));
        let x = Array::from_shape_vec((2, 1, 2, 2), (0..8).map(|v| v as f32).collect()).unwrap();
        let y = conv.infer(x.clone().into_dyn()).unwrap();
        assert_eq!(y, x.into_dyn());
    }

    #[test]
    fn sums_over_input_channels() {
        let conv = conv_with(vec![1., 10.], [1, 2, 1, 1], Window::new(1, 1, 0));
        let mut x = Array4::<f32>::zeros((1, 2, 1, 2));
        x[[0, 0, 0, 1]] = 1.;
        x[[0, 1, 0, 1]] = 2.;

        let y = conv.infer(x.into_dyn()).unwrap();
        assert_eq!(y.shape(), &[1, 1, 1, 2]);
        assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![0., 21.]);
    }

    #[test]
    fn padding_keeps_spatial_size() {
        let mut rng = StdRng::seed_from_u64(0);
        let conv = Conv2d::new(&mut rng, 3, 4, Window::new(3, 1, 1), true).unwrap();
        let y = conv.infer(Array4::<f32>::ones((2, 3, 8, 8)).into_dyn()).unwrap();
        assert_eq!(y.shape(), &[2, 4, 8, 8]);
        assert_eq!(conv.size(), 4 * 3 * 9 + 4);
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let conv = conv_with(vec![1.], [1, 1, 1, 1], Window::new(1, 1, 0));
        let err = conv.infer(Array4::<f32>::ones((1, 2, 2, 2)).into_dyn());
        assert!(matches!(err, Err(MlErr::SizeMismatch { .. })));
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut conv = conv_with(vec![1.], [1, 1, 1, 1], Window::new(1, 1, 0));
        let err = conv.backward(Array4::<f32>::ones((1, 1, 1, 1)).into_dyn());
        assert!(matches!(err, Err(MlErr::BackwardBeforeForward { .. })));
    }

    #[test]
    fn weight_gradient_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut conv = Conv2d::new(&mut rng, 2, 3, Window::new(3, 2, 1), true).unwrap();
        let x = ndarray::Array::from_shape_fn((2, 2, 5, 5), |(n, c, i, j)| {
            ((n * 31 + c * 17 + i * 5 + j) % 7) as f32 / 7. - 0.5
        })
        .into_dyn();

        // Loss is the plain sum of the outputs, so the upstream gradient is all ones.
        let y = conv.forward(x.clone()).unwrap();
        conv.backward(ArrayD::ones(y.raw_dim())).unwrap();
        let analytic = conv.weight().grad().clone();

        let eps = 1e-2;
        for idx in [0usize, 7, 20, 53] {
            let mut plus = conv.clone();
            plus.weight_mut().value_mut().as_slice_mut().unwrap()[idx] += eps;
            let mut minus = conv.clone();
            minus.weight_mut().value_mut().as_slice_mut().unwrap()[idx] -= eps;

            let numeric = (plus.infer(x.clone()).unwrap().sum()
                - minus.infer(x.clone()).unwrap().sum())
                / (2. * eps);
            let got = analytic.as_slice().unwrap()[idx];
            assert!((numeric - got).abs() < 1e-2, "{idx}: {numeric} vs {got}");
        }
    }
}
