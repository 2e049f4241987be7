use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-column statistics fitted by a normalization node.
///
/// `mean` and `std` share the same key set, one entry per normalized column,
/// in the order the columns were normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationModel {
    pub mean: IndexMap<String, f64>,
    pub std: IndexMap<String, f64>,
}

impl NormalizationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, mean: f64, std: f64) -> Self {
        let name = name.into();
        self.mean.insert(name.clone(), mean);
        self.std.insert(name, std);
        self
    }

    /// `(mean, std)` for a column, if the model covers it.
    pub fn stats(&self, column: &str) -> Option<(f64, f64)> {
        Some((*self.mean.get(column)?, *self.std.get(column)?))
    }

    pub fn columns(&self) -> Vec<String> {
        self.mean.keys().cloned().collect()
    }
}
