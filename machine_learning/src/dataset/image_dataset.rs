use ndarray::{Array4, ArrayView3, Axis};

use crate::{MlErr, Result};

/// A set of labeled images stored as raw bytes in `[N, C, H, W]` layout.
#[derive(Debug, Clone)]
pub struct ImageDataset {
    images: Array4<u8>,
    labels: Vec<usize>,
    classes: usize,
}

impl ImageDataset {
    /// Creates a new `ImageDataset`.
    ///
    /// # Arguments
    /// * `images` - The pixels of every image, `[N, C, H, W]`.
    /// * `labels` - One label per image.
    /// * `classes` - The amount of classes, every label must be below it.
    ///
    /// # Returns
    /// A new `ImageDataset` or an error if the labels don't match the images.
    pub fn new(images: Array4<u8>, labels: Vec<usize>, classes: usize) -> Result<Self> {
        let n = images.len_of(Axis(0));
        if labels.len() != n {
            return Err(MlErr::SizeMismatch {
                what: "dataset labels",
                got: labels.len(),
                expected: n,
            });
        }

        if let Some(&label) = labels.iter().find(|&&l| l >= classes) {
            return Err(MlErr::LabelOutOfRange { label, classes });
        }

        Ok(Self {
            images,
            labels,
            classes,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Returns the `(C, H, W)` shape of a single image.
    pub fn image_dim(&self) -> (usize, usize, usize) {
        let (_, c, h, w) = self.images.dim();
        (c, h, w)
    }

    pub fn image(&self, i: usize) -> ArrayView3<'_, u8> {
        self.images.index_axis(Axis(0), i)
    }

    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }
}
