use std::{
    error::Error,
    fmt::{self, Display},
};

use machine_learning::MlErr;

/// The result type of the pruning module.
pub type Result<T> = std::result::Result<T, PruneErr>;

#[derive(Debug)]
pub enum PruneErr {
    /// The pruning intensity is NaN or outside `[0, 1]`.
    InvalidIntensity(f64),
    /// Structured pruning along an axis the weight tensor doesn't have.
    InvalidDimension { dim: usize, ndim: usize },
    Ml(MlErr),
    /// A trial of a sweep failed, aborting the whole sweep.
    TrialFailed {
        policy: &'static str,
        intensity: f64,
        source: Box<PruneErr>,
    },
}

impl Display for PruneErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneErr::InvalidIntensity(a) => {
                write!(f, "pruning intensity {a} is not within [0, 1]")
            }
            PruneErr::InvalidDimension { dim, ndim } => {
                write!(f, "cannot prune along dimension {dim} of a {ndim} dimensional weight")
            }
            PruneErr::Ml(e) => write!(f, "{e}"),
            PruneErr::TrialFailed {
                policy, intensity, ..
            } => write!(f, "pruning trial {policy} at intensity {intensity:.2} failed"),
        }
    }
}

impl Error for PruneErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PruneErr::Ml(e) => e.source(),
            PruneErr::TrialFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<MlErr> for PruneErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}
