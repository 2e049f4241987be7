use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Opaque column type tag advertised by upstream nodes (e.g. `float64`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnType(pub String);

impl From<&str> for ColumnType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Ordered mapping of column name to an optional type tag.
///
/// Used both as a requirement (what a port needs) and as a guarantee (what a
/// port emits). A `None` type only requires the column to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSet(IndexMap<String, Option<ColumnType>>);

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column set with every column of unknown type.
    pub fn untyped<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(|n| (n.into(), None)).collect())
    }

    pub fn with_column(mut self, name: impl Into<String>, ty: Option<ColumnType>) -> Self {
        self.insert(name, ty);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: Option<ColumnType>) {
        self.0.insert(name.into(), ty);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Type tag of `name`, `None` if the column is absent or untyped.
    pub fn column_type(&self, name: &str) -> Option<&ColumnType> {
        self.0.get(name).and_then(Option::as_ref)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<ColumnType>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project `names` onto this set, keeping known types and marking the
    /// rest as unknown. Order follows `names`.
    pub fn project(&self, names: &[String]) -> ColumnSet {
        names
            .iter()
            .map(|n| (n.clone(), self.column_type(n).cloned()))
            .collect()
    }
}

impl FromIterator<(String, Option<ColumnType>)> for ColumnSet {
    fn from_iter<T: IntoIterator<Item = (String, Option<ColumnType>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Column selection shared by planning and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    /// Columns to normalize, or to exclude when `include` is false.
    pub columns: Option<Vec<String>>,
    pub include: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            columns: None,
            include: true,
        }
    }
}

/// Resolve the ordered list of columns to normalize.
///
/// `known` is the ordered list of columns available on the primary input,
/// if anything is known about it. With `include` and an explicit list the
/// list is returned as is; otherwise `known` is required and the result
/// follows its order.
pub fn resolve_target_columns(
    conf: &NormalizationConfig,
    known: Option<&[String]>,
) -> Result<Vec<String>, FlowError> {
    match (&conf.columns, conf.include, known) {
        (Some(cols), true, _) => Ok(cols.clone()),
        (Some(cols), false, Some(known)) => Ok(known
            .iter()
            .filter(|c| !cols.contains(*c))
            .cloned()
            .collect()),
        (None, _, Some(known)) => Ok(known.to_vec()),
        (Some(_), false, None) => Err(FlowError::Configuration(
            "cannot exclude columns without knowing the input columns".to_string(),
        )),
        (None, _, None) => Err(FlowError::Configuration(
            "no columns configured and no upstream metadata to derive them".to_string(),
        )),
    }
}
