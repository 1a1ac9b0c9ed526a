mod evaluation;
mod stats;
mod trainer;

pub use evaluation::evaluate;
pub use stats::{EpochStats, TrainingSummary};
pub use trainer::{Trainer, TrainerConfig};
