use ndarray::{Array4, ArrayD, ArrayView4, Ix4, Zip};

use super::im2col::Window;
use crate::{MlErr, Result};

/// Max pooling over non padded windows of `[N, C, H, W]` inputs.
#[derive(Debug, Clone)]
pub struct MaxPool2d {
    window: Window,

    // Forward metadata, flat `iy * W + ix` position of each selected input.
    argmax: Option<Array4<usize>>,
    input_dim: (usize, usize, usize, usize),
}

impl MaxPool2d {
    pub fn new(kernel: usize, stride: usize) -> Self {
        Self {
            window: Window::new(kernel, stride, 0),
            argmax: None,
            input_dim: (0, 0, 0, 0),
        }
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (y, _) = self.pool(x.view())?;
        Ok(y.into_dyn())
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (y, argmax) = self.pool(x.view())?;
        self.input_dim = x.dim();
        self.argmax = Some(argmax);
        Ok(y.into_dyn())
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let argmax = self
            .argmax
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "max_pool2d" })?;

        let d = d.into_dimensionality::<Ix4>()?;
        let w = self.input_dim.3;
        let mut dx = Array4::<f32>::zeros(self.input_dim);

        Zip::from(dx.outer_iter_mut())
            .and(d.outer_iter())
            .and(argmax.outer_iter())
            .par_for_each(|mut dxn, dn, an| {
                for ((c, oy, ox), &pos) in an.indexed_iter() {
                    dxn[[c, pos / w, pos % w]] += dn[[c, oy, ox]];
                }
            });

        Ok(dx.into_dyn())
    }

    fn pool(&self, x: ArrayView4<f32>) -> Result<(Array4<f32>, Array4<usize>)> {
        let (n, c, h, w) = x.dim();
        let (ho, wo) = self.window.output_hw(h, w).ok_or(MlErr::SizeMismatch {
            what: "max_pool2d input height",
            got: h,
            expected: self.window.kernel,
        })?;

        let Window { kernel: k, stride: s, .. } = self.window;
        let mut y = Array4::<f32>::zeros((n, c, ho, wo));
        let mut argmax = Array4::<usize>::zeros((n, c, ho, wo));

        Zip::from(y.outer_iter_mut())
            .and(argmax.outer_iter_mut())
            .and(x.outer_iter())
            .par_for_each(|mut yn, mut an, xn| {
                for ((ci, oy, ox), out) in yn.indexed_iter_mut() {
                    let mut best = (f32::NEG_INFINITY, 0);
                    for ki in 0..k {
                        for kj in 0..k {
                            let (iy, ix) = (oy * s + ki, ox * s + kj);
                            let v = xn[[ci, iy, ix]];
                            if v > best.0 {
                                best = (v, iy * w + ix);
                            }
                        }
                    }

                    *out = best.0;
                    an[[ci, oy, ox]] = best.1;
                }
            });

        Ok((y, argmax))
    }
}

/// Averages every channel over its whole spatial extent, `[N, C, H, W] -> [N, C, 1, 1]`.
#[derive(Debug, Clone, Default)]
pub struct GlobalAvgPool {
    input_dim: Option<(usize, usize, usize, usize)>,
}

impl GlobalAvgPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infer(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (n, c, h, w) = x.dim();
        let area = (h * w).max(1) as f32;
        let y = Array4::from_shape_fn((n, c, 1, 1), |(ni, ci, _, _)| {
            x.slice(ndarray::s![ni, ci, .., ..]).sum() / area
        });

        Ok(y.into_dyn())
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let shape = x.shape().to_vec();
        let y = self.infer(x)?;
        self.input_dim = Some((shape[0], shape[1], shape[2], shape[3]));
        Ok(y)
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let (n, c, h, w) = self
            .input_dim
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "global_avg_pool" })?;

        let d = d.into_dimensionality::<Ix4>()?;
        let area = (h * w).max(1) as f32;
        let dx = Array4::from_shape_fn((n, c, h, w), |(ni, ci, _, _)| d[[ni, ci, 0, 0]] / area);
        Ok(dx.into_dyn())
    }
}
