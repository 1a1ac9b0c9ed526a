use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Serialize, Serializer};

use super::{
    Sequential,
    layers::{Layer, Window},
};
use crate::{MlErr, Result};

const VGG16: [Option<usize>; 18] = [
    Some(64),
    Some(64),
    None,
    Some(128),
    Some(128),
    None,
    Some(256),
    Some(256),
    Some(256),
    None,
    Some(512),
    Some(512),
    Some(512),
    None,
    Some(512),
    Some(512),
    Some(512),
    None,
];

const RESNET18_WIDTHS: [usize; 4] = [64, 128, 256, 512];

/// The small variants divide every width by this factor.
const SMALL_DIVISOR: usize = 4;

/// The architectures the builder knows how to construct, all for 3 x 32 x 32 inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    ResNet18,
    ResNet18Small,
    Vgg16,
    Vgg16Small,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::ResNet18 => "resnet18",
            ModelKind::ResNet18Small => "resnet18_s",
            ModelKind::Vgg16 => "vgg16",
            ModelKind::Vgg16Small => "vgg16_s",
        }
    }

    /// Builds a freshly initialized model.
    ///
    /// # Arguments
    /// * `rng` - The random number generator used to initialize the parameters.
    /// * `classes` - The size of the output layer.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R, classes: usize) -> Result<Sequential> {
        match self {
            ModelKind::ResNet18 => resnet18(rng, classes, 1),
            ModelKind::ResNet18Small => resnet18(rng, classes, SMALL_DIVISOR),
            ModelKind::Vgg16 => vgg16(rng, classes, 1),
            ModelKind::Vgg16Small => vgg16(rng, classes, SMALL_DIVISOR),
        }
    }
}

impl Serialize for ModelKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resnet18" => Ok(ModelKind::ResNet18),
            "resnet18_s" => Ok(ModelKind::ResNet18Small),
            "vgg16" => Ok(ModelKind::Vgg16),
            "vgg16_s" => Ok(ModelKind::Vgg16Small),
            other => Err(MlErr::InvalidConfig(format!("unknown model {other}"))),
        }
    }
}

fn conv_bn_relu<R: Rng + ?Sized>(
    rng: &mut R,
    in_channels: usize,
    out_channels: usize,
) -> Result<[Layer; 3]> {
    Ok([
        Layer::conv2d(rng, in_channels, out_channels, Window::new(3, 1, 1), true)?,
        Layer::batch_norm2d(out_channels),
        Layer::relu(),
    ])
}

fn vgg16<R: Rng + ?Sized>(rng: &mut R, classes: usize, divisor: usize) -> Result<Sequential> {
    let mut layers = Vec::new();
    let mut channels = 3;

    for entry in VGG16 {
        match entry {
            Some(width) => {
                let width = width / divisor;
                layers.extend(conv_bn_relu(rng, channels, width)?);
                channels = width;
            }
            None => layers.push(Layer::max_pool2d(2, 2)),
        }
    }

    layers.push(Layer::flatten());
    layers.push(Layer::dense(rng, (channels, classes))?);
    Ok(Sequential::new(layers))
}

fn basic_block<R: Rng + ?Sized>(
    rng: &mut R,
    in_planes: usize,
    planes: usize,
    stride: usize,
) -> Result<[Layer; 2]> {
    let main = vec![
        Layer::conv2d(rng, in_planes, planes, Window::new(3, stride, 1), false)?,
        Layer::batch_norm2d(planes),
        Layer::relu(),
        Layer::conv2d(rng, planes, planes, Window::new(3, 1, 1), false)?,
        Layer::batch_norm2d(planes),
    ];

    let shortcut = match stride != 1 || in_planes != planes {
        true => vec![
            Layer::conv2d(rng, in_planes, planes, Window::new(1, stride, 0), false)?,
            Layer::batch_norm2d(planes),
        ],
        false => vec![],
    };

    Ok([Layer::residual(main, shortcut), Layer::relu()])
}

fn resnet18<R: Rng + ?Sized>(rng: &mut R, classes: usize, divisor: usize) -> Result<Sequential> {
    let widths = RESNET18_WIDTHS.map(|w| w / divisor);
    let mut in_planes = widths[0];

    let mut layers = vec![
        Layer::conv2d(rng, 3, in_planes, Window::new(3, 1, 1), false)?,
        Layer::batch_norm2d(in_planes),
        Layer::relu(),
    ];

    for (stage, &planes) in widths.iter().enumerate() {
        let stride = if stage == 0 { 1 } else { 2 };
        layers.extend(basic_block(rng, in_planes, planes, stride)?);
        layers.extend(basic_block(rng, planes, planes, 1)?);
        in_planes = planes;
    }

    layers.push(Layer::global_avg_pool());
    layers.push(Layer::flatten());
    layers.push(Layer::dense(rng, (in_planes, classes))?);
    Ok(Sequential::new(layers))
}
