pub mod cifar10;
mod image_dataset;
mod loader;
mod synthetic;
mod transform;

pub use image_dataset::ImageDataset;
pub use loader::{Batch, Batches, DataLoader};
pub use synthetic::synthetic;
pub use transform::Transform;
