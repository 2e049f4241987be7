use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Operations the normalization executor needs from a tabular runtime.
///
/// `DataFrame` is the in-crate implementation; engines with their own table
/// type implement this trait to reuse the executor.
pub trait Table: Sized {
    /// Column names in table order.
    fn column_names(&self) -> Vec<String>;

    fn column(&self, name: &str) -> Option<&[f64]>;

    /// Arithmetic mean of a column, `None` if the column does not exist.
    fn mean(&self, name: &str) -> Option<f64> {
        self.column(name).map(mean)
    }

    /// Sample standard deviation (n - 1 denominator) of a column.
    fn std(&self, name: &str) -> Option<f64> {
        self.column(name).map(sample_std)
    }

    /// Copy of the table with `columns` overwritten in place. Columns not
    /// named keep their values and position.
    fn assign(&self, columns: IndexMap<String, Vec<f64>>) -> Self;
}

/// Basic table passed between processing nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    /// Column data keyed by column name, in column order
    pub columns: IndexMap<String, Vec<f64>>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    /// Number of rows, taken from the first column.
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Table for DataFrame {
    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    fn assign(&self, columns: IndexMap<String, Vec<f64>>) -> Self {
        let mut out = self.clone();
        for (name, values) in columns {
            out.columns.insert(name, values);
        }
        out
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// NaN for fewer than two values, matching the usual dataframe convention.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|&v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}
