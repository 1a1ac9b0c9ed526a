//! Magnitude based pruning of trained models and sweeps comparing the accuracy left after it.

mod amount;
mod error;
mod global;
mod mask;
mod policy;
mod sparsity;
mod structured;
mod sweep;
mod table;
mod unstructured;

pub use error::{PruneErr, Result};
pub use global::GlobalUnstructured;
pub use policy::{PruningPolicy, default_policies, prune};
pub use sparsity::{LayerSparsity, Sparsity};
pub use structured::{LnStructured, Norm};
pub use sweep::{SweepConfig, intensity_grid, sweep};
pub use table::{ResultTable, Trial};
pub use unstructured::L1Unstructured;
