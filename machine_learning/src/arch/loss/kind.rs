use std::{fmt, str::FromStr};

use serde::Serialize;

use super::{CrossEntropy, LossFn, Mse};
use crate::{MlErr, Result};

/// The loss a run trains with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    #[default]
    CrossEntropy,
    Mse,
}

impl LossKind {
    pub fn name(&self) -> &'static str {
        match self {
            LossKind::CrossEntropy => "cross_entropy",
            LossKind::Mse => "mse",
        }
    }

    pub fn build(&self) -> Box<dyn LossFn + Send + Sync> {
        match self {
            LossKind::CrossEntropy => Box::new(CrossEntropy::new()),
            LossKind::Mse => Box::new(Mse::new()),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LossKind {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cross_entropy" => Ok(LossKind::CrossEntropy),
            "mse" => Ok(LossKind::Mse),
            other => Err(MlErr::InvalidConfig(format!("unknown loss {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn names_roundtrip() {
        for kind in [LossKind::CrossEntropy, LossKind::Mse] {
            assert_eq!(kind.name().parse::<LossKind>().unwrap(), kind);
        }

        assert!("hinge".parse::<LossKind>().is_err());
    }

    #[test]
    fn built_loss_matches_its_kind() {
        let y_pred = array![[0.5, 0.5], [1., 0.]];
        let labels = [0, 0];

        let mse = LossKind::Mse.build();
        assert_eq!(mse.loss(y_pred.view(), &labels), Mse.loss(y_pred.view(), &labels));
        // Two of the four entries are off by 0.5.
        assert_eq!(mse.loss(y_pred.view(), &labels), 0.0625);

        let ce = LossKind::CrossEntropy.build();
        assert_eq!(
            ce.loss_prime(y_pred.view(), &labels),
            CrossEntropy.loss_prime(y_pred.view(), &labels)
        );
    }
}
