use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use ndarray::ShapeError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    Shape(ShapeError),
    NonContiguous {
        what: &'static str,
    },
    BackwardBeforeForward {
        layer: &'static str,
    },
    InvalidConfig(String),
    Init(String),
    DeviceUnavailable(String),
    EmptyDataset,
    LabelOutOfRange {
        label: usize,
        classes: usize,
    },
    MalformedDataset {
        path: PathBuf,
        reason: String,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch in {what}: got {got}, expected {expected}"),
            MlErr::Shape(e) => write!(f, "tensor shape error: {e}"),
            MlErr::NonContiguous { what } => {
                write!(f, "{what} is not laid out contiguously in memory")
            }
            MlErr::BackwardBeforeForward { layer } => {
                write!(f, "{layer} backward pass called without a preceding forward pass")
            }
            MlErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            MlErr::Init(msg) => write!(f, "failed to initialize parameters: {msg}"),
            MlErr::DeviceUnavailable(msg) => write!(f, "compute device unavailable: {msg}"),
            MlErr::EmptyDataset => write!(f, "the data source yielded no examples"),
            MlErr::LabelOutOfRange { label, classes } => write!(
                f,
                "malformed batch: label {label} is out of range for {classes} classes"
            ),
            MlErr::MalformedDataset { path, reason } => {
                write!(f, "malformed dataset file {}: {reason}", path.display())
            }
            MlErr::Io { path, source } => write!(f, "io error on {}: {source}", path.display()),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            MlErr::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}
