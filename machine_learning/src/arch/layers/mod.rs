mod batch_norm;
mod conv2d;
mod dense;
mod flatten;
mod im2col;
mod layer;
mod pool;
mod relu;
mod residual;

pub use batch_norm::BatchNorm2d;
pub use conv2d::Conv2d;
pub use dense::Dense;
pub use flatten::Flatten;
pub use im2col::Window;
pub use layer::{Layer, LayerKind, LayerSelector, conv_layers};
pub use pool::{GlobalAvgPool, MaxPool2d};
pub use relu::Relu;
pub use residual::Residual;
