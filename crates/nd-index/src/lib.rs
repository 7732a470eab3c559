#![forbid(unsafe_code)]

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use nd_types::{ErrorKind, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod selector;

pub use selector::{IndexMode, Selector, SelectorItem, SliceBounds, resolve_positions};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IndexLabel {
    Int64(i64),
    Utf8(String),
}

impl IndexLabel {
    /// Labels are restricted to numbers and strings; other scalars are rejected.
    pub fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Int64(v) => Some(Self::Int64(*v)),
            Scalar::Utf8(v) => Some(Self::Utf8(v.clone())),
            Scalar::Float64(v) if v.is_finite() && *v == v.trunc() => Some(Self::Int64(*v as i64)),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_scalar(&self) -> Scalar {
        match self {
            Self::Int64(v) => Scalar::Int64(*v),
            Self::Utf8(v) => Scalar::Utf8(v.clone()),
        }
    }
}

impl From<i64> for IndexLabel {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<&str> for IndexLabel {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for IndexLabel {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl fmt::Display for IndexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
        }
    }
}

/// Which axis a label list or selector addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Rows,
    Columns,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rows => "row",
            Self::Columns => "column",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    labels: Vec<IndexLabel>,
    #[serde(skip)]
    position_cache: OnceCell<HashMap<IndexLabel, usize>>,
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Index {}

impl Index {
    #[must_use]
    pub fn new(labels: Vec<IndexLabel>) -> Self {
        Self {
            labels,
            position_cache: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn from_i64(values: Vec<i64>) -> Self {
        Self::new(values.into_iter().map(IndexLabel::from).collect())
    }

    #[must_use]
    pub fn from_utf8(values: Vec<String>) -> Self {
        Self::new(values.into_iter().map(IndexLabel::from).collect())
    }

    /// `0..len` as integer labels.
    #[must_use]
    pub fn range(len: usize) -> Self {
        Self::new((0..len as i64).map(IndexLabel::Int64).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn labels(&self) -> &[IndexLabel] {
        &self.labels
    }

    #[must_use]
    pub fn into_labels(self) -> Vec<IndexLabel> {
        self.labels
    }

    fn positions(&self) -> &HashMap<IndexLabel, usize> {
        self.position_cache.get_or_init(|| {
            let mut positions = HashMap::with_capacity(self.labels.len());
            for (idx, label) in self.labels.iter().enumerate() {
                positions.entry(label.clone()).or_insert(idx);
            }
            positions
        })
    }

    /// First position holding `needle`.
    #[must_use]
    pub fn position(&self, needle: &IndexLabel) -> Option<usize> {
        self.positions().get(needle).copied()
    }

    #[must_use]
    pub fn contains(&self, label: &IndexLabel) -> bool {
        self.position(label).is_some()
    }

    #[must_use]
    pub fn first_duplicate(&self) -> Option<&IndexLabel> {
        if self.positions().len() == self.labels.len() {
            return None;
        }
        let mut seen = HashMap::<&IndexLabel, ()>::with_capacity(self.labels.len());
        self.labels
            .iter()
            .find(|label| seen.insert(*label, ()).is_some())
    }

    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.first_duplicate().is_some()
    }

    pub fn validate_unique(&self, axis: Axis) -> Result<(), IndexError> {
        match self.first_duplicate() {
            Some(label) => Err(IndexError::DuplicateLabel {
                axis,
                label: label.to_string(),
            }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn take(&self, positions: &[usize]) -> Self {
        Self::new(positions.iter().map(|&i| self.labels[i].clone()).collect())
    }

    #[must_use]
    pub fn argsort(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.labels.len()).collect();
        order.sort_by(|&a, &b| self.labels[a].cmp(&self.labels[b]));
        order
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("row label '{label}' not found in index")]
    LabelNotFound { label: String },
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },
    #[error("{axis} position {position} is out of range for length {len}")]
    OutOfRange {
        axis: Axis,
        position: i64,
        len: usize,
    },
    #[error("invalid {axis} selector: {reason}")]
    InvalidSelector { axis: Axis, reason: String },
    #[error("{axis} labels must be unique but '{label}' repeats")]
    DuplicateLabel { axis: Axis, label: String },
}

impl IndexError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LabelNotFound { .. } => ErrorKind::Index,
            Self::ColumnNotFound { .. } => ErrorKind::ColumnIndex,
            Self::OutOfRange { .. } => ErrorKind::Range,
            Self::InvalidSelector { .. } => ErrorKind::Type,
            Self::DuplicateLabel { .. } => ErrorKind::DuplicateLabel,
        }
    }
}
