use ndarray::ArrayD;

use crate::{MlErr, Result};

#[derive(Debug, Clone, Default)]
pub struct Relu {
    a: Option<ArrayD<f32>>,
}

impl Relu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infer(&self, x: ArrayD<f32>) -> ArrayD<f32> {
        x.mapv_into(|z| z.max(0.))
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> ArrayD<f32> {
        let a = self.infer(x);
        self.a = Some(a.clone());
        a
    }

    pub fn backward(&mut self, mut d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let a = self
            .a
            .take()
            .ok_or(MlErr::BackwardBeforeForward { layer: "relu" })?;

        d.zip_mut_with(&a, |d, &a| {
            if a <= 0. {
                *d = 0.;
            }
        });

        Ok(d)
    }
}
