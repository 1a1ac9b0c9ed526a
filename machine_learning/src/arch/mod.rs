mod builder;
pub mod init;
pub mod layers;
pub mod loss;
mod model;
mod param;
mod sequential;

pub use builder::ModelKind;
pub use model::Model;
pub use param::Param;
pub use sequential::Sequential;
