use ndarray::Array4;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::ImageDataset;
use crate::{MlErr, Result};

/// Generates a deterministic, learnable image classification dataset.
///
/// Image `i` has label `i % classes`. The image is dark noise with a bright square in the grid
/// cell of its class, brightest on channel `label % channels`.
///
/// # Arguments
/// * `classes` - The amount of classes.
/// * `len` - The amount of images.
/// * `dim` - The `(C, H, W)` shape of every image.
/// * `seed` - Seed of the noise.
///
/// # Returns
/// The dataset, or an error if the image is too small to fit one cell per class.
pub fn synthetic(
    classes: usize,
    len: usize,
    dim: (usize, usize, usize),
    seed: u64,
) -> Result<ImageDataset> {
    let (c, h, w) = dim;
    let grid = (classes as f64).sqrt().ceil() as usize;
    let cell = h.min(w) / grid.max(1);

    if classes == 0 || c == 0 || cell == 0 {
        return Err(MlErr::InvalidConfig(format!(
            "cannot fit {classes} classes in {c}x{h}x{w} images"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut images = Array4::<u8>::zeros((len, c, h, w));
    images.mapv_inplace(|_: u8| rng.random_range(0..64));

    let labels: Vec<usize> = (0..len).map(|i| i % classes).collect();

    for (i, &label) in labels.iter().enumerate() {
        let (row, col) = (label / grid, label % grid);
        let bright = label % c;

        for ch in 0..c {
            let value = if ch == bright { 255 } else { 128 };
            for y in row * cell..(row + 1) * cell {
                for x in col * cell..(col + 1) * cell {
                    images[[i, ch, y, x]] = value;
                }
            }
        }
    }

    ImageDataset::new(images, labels, classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_images() {
        let a = synthetic(4, 8, (3, 8, 8), 1).unwrap();
        let b = synthetic(4, 8, (3, 8, 8), 1).unwrap();

        for i in 0..8 {
            assert_eq!(a.image(i), b.image(i));
            assert_eq!(a.label(i), i % 4);
        }
    }

    #[test]
    fn too_many_classes_for_image() {
        assert!(synthetic(100, 1, (1, 4, 4), 0).is_err());
    }
}
