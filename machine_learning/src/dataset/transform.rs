use ndarray::{ArrayView3, ArrayViewMut3};
use rand::Rng;

/// Channel means of the CIFAR-10 training split.
pub const CIFAR10_MEAN: [f32; 3] = [0.4914, 0.4822, 0.4465];

/// Channel standard deviations used to normalize CIFAR-10.
pub const CIFAR10_STD: [f32; 3] = [0.2023, 0.1994, 0.2010];

/// Per-image preprocessing: optional random crop and flip, followed by normalization.
///
/// The random parts only run when the loader is given a random number generator, so the same
/// `Transform` can be shared between training and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    padding: usize,
    flip: bool,
    mean: Vec<f32>,
    std: Vec<f32>,
}

/// The random choices made for a single image.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Augment {
    dy: usize,
    dx: usize,
    flip: bool,
}

impl Transform {
    /// Creates a new `Transform`.
    ///
    /// # Arguments
    /// * `padding` - Zero padding around the image before a random crop of the original size.
    /// * `flip` - Whether to mirror the image horizontally with probability one half.
    /// * `mean` - Per channel mean subtracted after scaling the pixels to `[0, 1]`.
    /// * `std` - Per channel standard deviation the centered pixels are divided by.
    pub fn new(padding: usize, flip: bool, mean: Vec<f32>, std: Vec<f32>) -> Self {
        Self {
            padding,
            flip,
            mean,
            std,
        }
    }

    /// Random 32x32 crop from 4px zero padding and random horizontal flip, then normalization.
    pub fn cifar10_train() -> Self {
        Self::new(4, true, CIFAR10_MEAN.into(), CIFAR10_STD.into())
    }

    /// Normalization only.
    pub fn cifar10_test() -> Self {
        Self::new(0, false, CIFAR10_MEAN.into(), CIFAR10_STD.into())
    }

    /// Scales pixels to `[0, 1]` without any normalization.
    pub fn identity() -> Self {
        Self::new(0, false, Vec::new(), Vec::new())
    }

    pub(super) fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Augment {
        let mut augment = Augment::default();

        if self.padding > 0 {
            augment.dy = rng.random_range(0..=2 * self.padding);
            augment.dx = rng.random_range(0..=2 * self.padding);
        }

        if self.flip {
            augment.flip = rng.random_bool(0.5);
        }

        augment
    }

    /// The choices that leave the image geometry untouched.
    pub(super) fn centered(&self) -> Augment {
        Augment {
            dy: self.padding,
            dx: self.padding,
            flip: false,
        }
    }

    /// Writes the preprocessed `image` into `out`, both `[C, H, W]`.
    pub(super) fn apply(&self, image: ArrayView3<u8>, augment: Augment, mut out: ArrayViewMut3<f32>) {
        let (c, h, w) = image.dim();
        let pad = self.padding;

        for ch in 0..c {
            let mean = self.mean.get(ch).copied().unwrap_or(0.);
            let std = self.std.get(ch).copied().unwrap_or(1.);

            for y in 0..h {
                for x in 0..w {
                    let x_crop = if augment.flip { w - 1 - x } else { x };
                    let sy = (y + augment.dy).checked_sub(pad).filter(|&sy| sy < h);
                    let sx = (x_crop + augment.dx).checked_sub(pad).filter(|&sx| sx < w);

                    let pixel = match (sy, sx) {
                        (Some(sy), Some(sx)) => image[[ch, sy, sx]],
                        _ => 0,
                    };

                    out[[ch, y, x]] = (pixel as f32 / 255. - mean) / std;
                }
            }
        }
    }
}
