use machine_learning::arch::{Model, Param, layers::LayerSelector};

use crate::{GlobalUnstructured, L1Unstructured, LnStructured, Result};

/// A strategy deciding which weights of a model to zero.
pub trait PruningPolicy: Send + Sync {
    /// A stable name identifying the policy in results and logs.
    fn name(&self) -> &'static str;

    /// Zeroes a fraction `intensity` of the given weights.
    ///
    /// Either every weight is pruned or, on error, none is touched.
    ///
    /// # Arguments
    /// * `weights` - The weight tensors to prune, in construction order.
    /// * `intensity` - The fraction to prune, within `[0, 1]`.
    fn prune_weights(&self, weights: &mut [&mut Param], intensity: f64) -> Result<()>;
}

/// Prunes the weights of the layers of `model` matching `selector`.
///
/// The zeros are written into the weight tensors themselves; no mask is kept around.
///
/// # Arguments
/// * `policy` - How to choose the weights.
/// * `model` - The model to prune, usually a fresh clone of a trained one.
/// * `intensity` - The fraction to prune, within `[0, 1]`.
/// * `selector` - Which layers are pruned.
///
/// # Returns
/// The pruned model, or an error if the intensity is invalid, in which case nothing is pruned.
pub fn prune<M, P>(policy: &P, mut model: M, intensity: f64, selector: LayerSelector) -> Result<M>
where
    M: Model,
    P: PruningPolicy + ?Sized,
{
    {
        let mut weights = model.weights_mut(selector);
        policy.prune_weights(&mut weights, intensity)?;
    }

    Ok(model)
}

/// The three policies compared by a sweep, in their reporting order.
pub fn default_policies() -> Vec<Box<dyn PruningPolicy>> {
    vec![
        Box::new(L1Unstructured),
        Box::new(LnStructured::default()),
        Box::new(GlobalUnstructured),
    ]
}
