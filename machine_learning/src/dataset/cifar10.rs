//! Reader for the binary distribution of CIFAR-10.
//!
//! Every record is one label byte followed by the red, green and blue planes of a 32x32 image,
//! each plane in row major order.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use ndarray::Array4;

use super::ImageDataset;
use crate::{MlErr, Result};

pub const CLASSES: usize = 10;
pub const CHANNELS: usize = 3;
pub const SIDE: usize = 32;

const IMAGE_BYTES: usize = CHANNELS * SIDE * SIDE;
const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

const ARCHIVE_DIR: &str = "cifar-10-batches-bin";
const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILE: &str = "test_batch.bin";

/// Loads the training and test splits.
///
/// # Arguments
/// * `dir` - Either the extracted `cifar-10-batches-bin` directory or its parent.
///
/// # Returns
/// The `(train, test)` datasets, or an error if a file is missing or malformed.
pub fn load(dir: &Path) -> Result<(ImageDataset, ImageDataset)> {
    let nested = dir.join(ARCHIVE_DIR);
    let root = if nested.is_dir() { nested } else { dir.to_path_buf() };

    let train_paths: Vec<PathBuf> = TRAIN_FILES.iter().map(|f| root.join(f)).collect();
    let train = read_split(&train_paths)?;
    let test = read_split(&[root.join(TEST_FILE)])?;

    info!(
        "loaded CIFAR-10 from {}: {} train, {} test images",
        root.display(),
        train.len(),
        test.len()
    );

    Ok((train, test))
}

/// Reads and concatenates the records of every file in `paths`.
pub fn read_split(paths: &[PathBuf]) -> Result<ImageDataset> {
    let mut pixels = Vec::new();
    let mut labels = Vec::new();

    for path in paths {
        let bytes = fs::read(path).map_err(|source| MlErr::Io {
            path: path.clone(),
            source,
        })?;

        let records = parse_records(path, &bytes, &mut pixels, &mut labels)?;
        debug!("read {records} records from {}", path.display());
    }

    let images = Array4::from_shape_vec((labels.len(), CHANNELS, SIDE, SIDE), pixels)?;
    ImageDataset::new(images, labels, CLASSES)
}

fn parse_records(
    path: &Path,
    bytes: &[u8],
    pixels: &mut Vec<u8>,
    labels: &mut Vec<usize>,
) -> Result<usize> {
    if bytes.is_empty() || bytes.len() % RECORD_BYTES != 0 {
        return Err(MlErr::MalformedDataset {
            path: path.to_path_buf(),
            reason: format!(
                "size {} is not a positive multiple of the {RECORD_BYTES} byte record",
                bytes.len()
            ),
        });
    }

    let records = bytes.len() / RECORD_BYTES;
    pixels.reserve(records * IMAGE_BYTES);
    labels.reserve(records);

    for (i, record) in bytes.chunks_exact(RECORD_BYTES).enumerate() {
        let label = record[0] as usize;
        if label >= CLASSES {
            return Err(MlErr::MalformedDataset {
                path: path.to_path_buf(),
                reason: format!("record {i} has label {label}"),
            });
        }

        labels.push(label);
        pixels.extend_from_slice(&record[1..]);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut record = vec![label];
        record.extend(std::iter::repeat_n(fill, IMAGE_BYTES));
        record
    }

    #[test]
    fn parses_planes_in_channel_order() {
        let mut bytes = record(3, 0);
        bytes[1 + SIDE * SIDE] = 200; // first green pixel
        bytes.extend(record(9, 7));

        let mut pixels = Vec::new();
        let mut labels = Vec::new();
        let n = parse_records(Path::new("x"), &bytes, &mut pixels, &mut labels).unwrap();

        assert_eq!(n, 2);
        assert_eq!(labels, [3, 9]);

        let images = Array4::from_shape_vec((2, CHANNELS, SIDE, SIDE), pixels).unwrap();
        assert_eq!(images[[0, 1, 0, 0]], 200);
        assert_eq!(images[[0, 0, 0, 0]], 0);
        assert_eq!(images[[1, 2, 31, 31]], 7);
    }

    #[test]
    fn truncated_file_is_malformed() {
        let mut bytes = record(0, 0);
        bytes.pop();

        let err = parse_records(Path::new("x"), &bytes, &mut Vec::new(), &mut Vec::new());
        assert!(matches!(err, Err(MlErr::MalformedDataset { .. })));
    }

    #[test]
    fn label_above_nine_is_malformed() {
        let bytes = record(10, 0);
        let err = parse_records(Path::new("x"), &bytes, &mut Vec::new(), &mut Vec::new());
        assert!(matches!(err, Err(MlErr::MalformedDataset { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/cifar")).unwrap_err();
        assert!(matches!(err, MlErr::Io { .. }));
    }
}
