use std::{num::NonZeroUsize, sync::Arc};

use ndarray::{Array4, Axis, parallel::prelude::*};
use rand::{RngCore, seq::SliceRandom};

use super::{ImageDataset, Transform};

/// A batch of preprocessed images and their labels.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Array4<f32>,
    pub labels: Vec<usize>,
}

/// Splits an `ImageDataset` into batches, transforming every image on the way out.
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: Arc<ImageDataset>,
    batch_size: NonZeroUsize,
    shuffle: bool,
    transform: Transform,
}

impl DataLoader {
    /// Creates a new `DataLoader`.
    ///
    /// # Arguments
    /// * `dataset` - The images to serve, shared with other loaders.
    /// * `batch_size` - The amount of images per batch, the last batch may be smaller.
    /// * `shuffle` - Whether `train_batches` visits the images in a random order.
    /// * `transform` - The preprocessing applied to each image.
    pub fn new(
        dataset: Arc<ImageDataset>,
        batch_size: NonZeroUsize,
        shuffle: bool,
        transform: Transform,
    ) -> Self {
        Self {
            dataset,
            batch_size,
            shuffle,
            transform,
        }
    }

    pub fn dataset(&self) -> &ImageDataset {
        &self.dataset
    }

    /// Returns the amount of batches in one pass.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size.get())
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Iterates the dataset once in storage order, with no random augmentation.
    pub fn batches(&self) -> Batches<'_> {
        Batches {
            loader: self,
            order: (0..self.dataset.len()).collect(),
            cursor: 0,
            rng: None,
        }
    }

    /// Iterates the dataset once, shuffled if the loader was built to, drawing the random
    /// augmentation of every image from `rng`.
    pub fn train_batches<'a, R: RngCore>(&'a self, rng: &'a mut R) -> Batches<'a> {
        let mut order: Vec<_> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(rng);
        }

        Batches {
            loader: self,
            order,
            cursor: 0,
            rng: Some(rng),
        }
    }
}

/// An iterator over the batches of a `DataLoader`.
pub struct Batches<'a> {
    loader: &'a DataLoader,
    order: Vec<usize>,
    cursor: usize,
    rng: Option<&'a mut dyn RngCore>,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let loader = self.loader;
        let DataLoader {
            dataset,
            batch_size,
            transform,
            ..
        } = loader;

        let end = (self.cursor + batch_size.get()).min(self.order.len());
        let indices = self.order.get(self.cursor..end).filter(|s| !s.is_empty())?;
        self.cursor = end;

        let augments: Vec<_> = match self.rng.as_deref_mut() {
            Some(rng) => indices.iter().map(|_| transform.draw(&mut *rng)).collect(),
            None => indices.iter().map(|_| transform.centered()).collect(),
        };

        let (c, h, w) = dataset.image_dim();
        let mut inputs = Array4::zeros((indices.len(), c, h, w));

        inputs
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(indices.par_iter().zip(augments.par_iter()))
            .for_each(|(out, (&i, &augment))| {
                transform.apply(dataset.image(i), augment, out);
            });

        let labels = indices.iter().map(|&i| dataset.label(i)).collect();

        Some(Batch { inputs, labels })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.order.len() - self.cursor).div_ceil(self.loader.batch_size.get());
        (left, Some(left))
    }
}

impl ExactSizeIterator for Batches<'_> {}
