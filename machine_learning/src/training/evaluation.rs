use ndarray::ArrayView2;

use crate::{MlErr, Result, arch::Model, dataset::DataLoader};

/// Computes the accuracy of `model` over every batch of `loader`, in percent.
///
/// Runs inference only: batch normalization uses its running statistics and the model is
/// never mutated. The loader is traversed once in storage order, so the result is
/// deterministic for a fixed model.
///
/// # Returns
/// The accuracy in `[0, 100]`, or `EmptyDataset` if the loader has no examples.
pub fn evaluate<M: Model>(model: &M, loader: &DataLoader) -> Result<f64> {
    let mut correct = 0;
    let mut total = 0;

    for batch in loader.batches() {
        let out = model.infer(batch.inputs.into_dyn())?;
        correct += count_correct(out.view(), &batch.labels)?;
        total += batch.labels.len();
    }

    if total == 0 {
        return Err(MlErr::EmptyDataset);
    }

    Ok(100. * correct as f64 / total as f64)
}

/// Counts the rows of `out` whose arg-max is the row's label.
///
/// # Returns
/// `LabelOutOfRange` if a label has no output column, or a size mismatch if the amount of rows
/// and labels differ.
pub(super) fn count_correct(out: ArrayView2<f32>, labels: &[usize]) -> Result<usize> {
    if out.nrows() != labels.len() {
        return Err(MlErr::SizeMismatch {
            what: "model output rows",
            got: out.nrows(),
            expected: labels.len(),
        });
    }

    let classes = out.ncols();
    let mut correct = 0;

    for (row, &label) in out.rows().into_iter().zip(labels) {
        if label >= classes {
            return Err(MlErr::LabelOutOfRange { label, classes });
        }

        if argmax(row.iter().copied()) == Some(label) {
            correct += 1;
        }
    }

    Ok(correct)
}

/// Returns the index of the largest value, the lowest index among ties.
fn argmax(values: impl Iterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, v) in values.enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }

    best.map(|(i, _)| i)
}
