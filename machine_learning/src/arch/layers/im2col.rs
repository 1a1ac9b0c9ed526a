use ndarray::{Array2, Array4, ArrayView2, ArrayView4, Axis, parallel::prelude::*};

/// Sliding window geometry shared by convolutions and pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub kernel: usize,
    pub stride: usize,
    pub padding: usize,
}

impl Window {
    pub fn new(kernel: usize, stride: usize, padding: usize) -> Self {
        Self {
            kernel,
            stride,
            padding,
        }
    }

    /// Returns the spatial output size for an `h` x `w` input, or `None` if the window does
    /// not fit.
    pub fn output_hw(&self, h: usize, w: usize) -> Option<(usize, usize)> {
        let Self {
            kernel: k,
            stride: s,
            padding: p,
        } = *self;

        if s == 0 || h + 2 * p < k || w + 2 * p < k {
            return None;
        }

        Some(((h + 2 * p - k) / s + 1, (w + 2 * p - k) / s + 1))
    }

    /// Maps an output coordinate and kernel offset back onto the unpadded input, `None` if it
    /// lands on padding.
    #[inline]
    fn source(&self, out: usize, offset: usize, len: usize) -> Option<usize> {
        (out * self.stride + offset)
            .checked_sub(self.padding)
            .filter(|&i| i < len)
    }
}

/// Unfolds every receptive field of `x` into a column.
///
/// The result has shape `[C * k * k, N * Ho * Wo]`, row `(c, ki, kj)` holds the input pixel seen
/// by kernel tap `(ki, kj)` of channel `c`, column `n * Ho * Wo + oy * Wo + ox` is the window at
/// output `(oy, ox)` of sample `n`.
pub fn im2col(x: ArrayView4<f32>, window: Window, (ho, wo): (usize, usize)) -> Array2<f32> {
    let (n, c, h, w) = x.dim();
    let k = window.kernel;
    let plane = ho * wo;

    let mut cols = Array2::zeros((c * k * k, n * plane));
    cols.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, mut col)| {
            let (ci, ki, kj) = (row / (k * k), (row / k) % k, row % k);

            for ni in 0..n {
                for oy in 0..ho {
                    let Some(iy) = window.source(oy, ki, h) else {
                        continue;
                    };

                    for ox in 0..wo {
                        if let Some(ix) = window.source(ox, kj, w) {
                            col[ni * plane + oy * wo + ox] = x[[ni, ci, iy, ix]];
                        }
                    }
                }
            }
        });

    cols
}

/// Folds columns produced by `im2col` back onto an input shaped `dim`, summing overlaps.
pub fn col2im(
    cols: ArrayView2<f32>,
    dim: (usize, usize, usize, usize),
    window: Window,
    (ho, wo): (usize, usize),
) -> Array4<f32> {
    let (_, c, h, w) = dim;
    let k = window.kernel;
    let plane = ho * wo;

    let mut dx = Array4::zeros(dim);
    dx.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(ni, mut sample)| {
            for ci in 0..c {
                for ki in 0..k {
                    for kj in 0..k {
                        let row = (ci * k + ki) * k + kj;

                        for oy in 0..ho {
                            let Some(iy) = window.source(oy, ki, h) else {
                                continue;
                            };

                            for ox in 0..wo {
                                if let Some(ix) = window.source(ox, kj, w) {
                                    sample[[ci, iy, ix]] += cols[[row, ni * plane + oy * wo + ox]];
                                }
                            }
                        }
                    }
                }
            }
        });

    dx
}
