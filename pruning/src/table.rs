use serde::{Serialize, Serializer, ser::SerializeMap};

/// The accuracy of a model pruned at one intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trial {
    pub intensity: f64,
    /// Accuracy in percent.
    pub accuracy: f64,
}

/// The accuracy curve of every policy of a sweep, serialized as a map from policy name to its
/// trials in ascending intensity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    curves: Vec<(&'static str, Vec<Trial>)>,
}

impl ResultTable {
    pub fn new(curves: Vec<(&'static str, Vec<Trial>)>) -> Self {
        Self { curves }
    }

    /// Returns the names of the policies, in sweep order.
    pub fn policies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.curves.iter().map(|(name, _)| *name)
    }

    pub fn curve(&self, policy: &str) -> Option<&[Trial]> {
        self.curves
            .iter()
            .find(|(name, _)| *name == policy)
            .map(|(_, trials)| trials.as_slice())
    }

    /// Returns the accuracy recorded for `policy` at `intensity`.
    pub fn accuracy(&self, policy: &str, intensity: f64) -> Option<f64> {
        self.curve(policy)?
            .iter()
            .find(|t| (t.intensity - intensity).abs() < 1e-9)
            .map(|t| t.accuracy)
    }
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.curves.len()))?;
        for (name, trials) in &self.curves {
            map.serialize_entry(name, trials)?;
        }

        map.end()
    }
}
