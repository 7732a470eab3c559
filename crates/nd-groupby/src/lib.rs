#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::str::FromStr;

use nd_columnar::cast_scalar;
use nd_frame::{DataFrame, FrameError, NdFrame, Selector, Table};
use nd_index::Index;
use nd_types::{DType, ErrorKind, Scalar, infer_dtypes};
use thiserror::Error;

mod agg;
mod tree;

pub use agg::AggOp;
pub use tree::GroupKeyTree;

use agg::AggValue;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GroupByError {
    #[error("unknown aggregation '{name}'")]
    OperationNotFound { name: String },
    #[error("groupby column '{name}' not found")]
    ColumnNotFound { name: String },
    #[error("'{op}' needs a numeric column but '{column}' is {dtype}")]
    NonNumericColumn {
        column: String,
        op: AggOp,
        dtype: DType,
    },
    #[error("group key has {actual} values for {expected} key columns")]
    KeyArity { expected: usize, actual: usize },
    #[error("no group with key ({key})")]
    GroupNotFound { key: String },
    #[error("applied function returned columns {actual:?} after {expected:?}")]
    InconsistentApply {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl GroupByError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OperationNotFound { .. } => ErrorKind::OperationNotFound,
            Self::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            Self::NonNumericColumn { .. } => ErrorKind::DtypeNotSupported,
            Self::KeyArity { .. } | Self::InconsistentApply { .. } => ErrorKind::Shape,
            Self::GroupNotFound { .. } => ErrorKind::Index,
            Self::Frame(err) => err.kind(),
        }
    }
}

/// `frame.groupby(&["k"])` on any [`DataFrame`].
pub trait GroupByExt {
    fn groupby(&self, keys: &[&str]) -> Result<GroupBy<'_>, GroupByError>;
}

impl GroupByExt for DataFrame {
    fn groupby(&self, keys: &[&str]) -> Result<GroupBy<'_>, GroupByError> {
        GroupBy::new(self, keys)
    }
}

/// Rows of a frame partitioned by key columns, ready for aggregation.
#[derive(Debug, Clone)]
pub struct GroupBy<'a> {
    frame: &'a DataFrame,
    keys: Vec<String>,
    targets: Vec<String>,
    tree: GroupKeyTree<Vec<usize>>,
}

fn require_column(frame: &DataFrame, name: &str) -> Result<usize, GroupByError> {
    frame
        .columns()
        .iter()
        .position(|column| column == name)
        .ok_or_else(|| GroupByError::ColumnNotFound {
            name: name.to_owned(),
        })
}

fn describe_key(key: &[Scalar]) -> String {
    key.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Integral values in a float output column become floats.
fn widen(value: &mut Scalar, dtype: DType) {
    if dtype == DType::Float64
        && matches!(value, Scalar::Int64(_) | Scalar::Bool(_))
        && let Ok(cast) = cast_scalar(value, DType::Float64)
    {
        *value = cast;
    }
}

struct Target<'f> {
    name: String,
    op: AggOp,
    dtype: DType,
    values: Cow<'f, [Scalar]>,
}

impl<'a> GroupBy<'a> {
    /// Validate `keys`, then partition the rows. Targets default to every
    /// non-key column.
    pub fn new(frame: &'a DataFrame, keys: &[&str]) -> Result<Self, GroupByError> {
        for key in keys {
            require_column(frame, key)?;
        }
        let key_values = keys
            .iter()
            .map(|key| frame.column_values(key))
            .collect::<Result<Vec<_>, FrameError>>()?;
        let key_slices: Vec<&[Scalar]> = key_values.iter().map(AsRef::as_ref).collect();
        let tree = GroupKeyTree::partition(&key_slices, frame.len());

        let targets = frame
            .columns()
            .iter()
            .filter(|column| !keys.contains(&column.as_str()))
            .cloned()
            .collect();
        Ok(Self {
            frame,
            keys: keys.iter().map(|key| (*key).to_owned()).collect(),
            targets,
            tree,
        })
    }

    /// Restrict aggregation to `targets`.
    pub fn col(mut self, targets: &[&str]) -> Result<Self, GroupByError> {
        for target in targets {
            require_column(self.frame, target)?;
        }
        self.targets = targets.iter().map(|target| (*target).to_owned()).collect();
        Ok(self)
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    #[must_use]
    pub fn tree(&self) -> &GroupKeyTree<Vec<usize>> {
        &self.tree
    }

    #[must_use]
    pub fn ngroups(&self) -> usize {
        self.tree.leaf_count()
    }

    fn group_frame(&self, rows: &[usize]) -> Result<DataFrame, GroupByError> {
        let positions: Vec<i64> = rows.iter().map(|&row| row as i64).collect();
        Ok(self
            .frame
            .iloc(&Selector::positions(&positions), &Selector::All)?)
    }

    /// Every group with its key tuple, in first-seen key order.
    pub fn groups(&self) -> Result<Vec<(Vec<Scalar>, DataFrame)>, GroupByError> {
        self.tree
            .leaves()
            .into_iter()
            .map(|(key, rows)| Ok((key, self.group_frame(rows)?)))
            .collect()
    }

    pub fn get_group(&self, key: &[Scalar]) -> Result<DataFrame, GroupByError> {
        if key.len() != self.keys.len() {
            return Err(GroupByError::KeyArity {
                expected: self.keys.len(),
                actual: key.len(),
            });
        }
        let rows = self.tree.find(key).ok_or_else(|| GroupByError::GroupNotFound {
            key: describe_key(key),
        })?;
        self.group_frame(rows)
    }

    fn key_dtypes(&self) -> Result<Vec<DType>, GroupByError> {
        self.keys
            .iter()
            .map(|key| Ok(self.frame.dtypes()[require_column(self.frame, key)?]))
            .collect()
    }

    /// Apply `op` to every target column.
    pub fn aggregate(&self, op: AggOp) -> Result<DataFrame, GroupByError> {
        let plan: Vec<(&str, AggOp)> = self.targets.iter().map(|t| (t.as_str(), op)).collect();
        self.agg(&plan)
    }

    /// `aggregate` with the operation given by name, e.g. `"mean"`.
    pub fn aggregate_by_name(&self, name: &str) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::from_str(name)?)
    }

    /// Per-column operations. Scalar results are repeated alongside
    /// cumulative ones so every output row of a group has a value.
    pub fn agg(&self, plan: &[(&str, AggOp)]) -> Result<DataFrame, GroupByError> {
        let mut targets = Vec::with_capacity(plan.len());
        for &(name, op) in plan {
            let position = require_column(self.frame, name)?;
            let dtype = self.frame.dtypes()[position];
            if op.requires_numeric() && !(dtype.is_numeric() || dtype == DType::Undefined) {
                return Err(GroupByError::NonNumericColumn {
                    column: name.to_owned(),
                    op,
                    dtype,
                });
            }
            targets.push(Target {
                name: name.to_owned(),
                op,
                dtype,
                values: self.frame.column_values(name)?,
            });
        }

        let aggregated = self.tree.try_map(&mut |_, rows: &Vec<usize>| {
            Ok::<_, GroupByError>(leaf_rows(rows, &targets))
        })?;
        let mut rows = aggregated.flatten();

        let n_keys = self.keys.len();
        let mut names = self.keys.clone();
        let mut dtypes = self.key_dtypes()?;
        for (offset, target) in targets.iter().enumerate() {
            let col = n_keys + offset;
            let dtype = target
                .op
                .output_dtype(target.dtype, rows.iter().map(|row| &row[col]));
            for row in &mut rows {
                widen(&mut row[col], dtype);
            }
            names.push(target.op.output_name(&target.name));
            dtypes.push(dtype);
        }

        let n_rows = rows.len();
        Ok(DataFrame::from_parts(
            rows,
            Index::range(n_rows),
            names,
            dtypes,
            *self.frame.config(),
        )?)
    }

    pub fn count(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Count)
    }

    pub fn sum(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Sum)
    }

    pub fn mean(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Mean)
    }

    pub fn std(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Std)
    }

    pub fn var(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Var)
    }

    pub fn mode(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Mode)
    }

    pub fn min(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Min)
    }

    pub fn max(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::Max)
    }

    pub fn cumsum(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::CumSum)
    }

    pub fn cumprod(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::CumProd)
    }

    pub fn cummax(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::CumMax)
    }

    pub fn cummin(&self) -> Result<DataFrame, GroupByError> {
        self.aggregate(AggOp::CumMin)
    }

    /// Run `f` on every group frame and stack the results, each row prefixed
    /// with its group's key values. All groups must yield the same columns.
    pub fn apply<F>(&self, mut f: F) -> Result<DataFrame, GroupByError>
    where
        F: FnMut(&DataFrame) -> Result<Table, FrameError>,
    {
        let mut result_columns: Option<Vec<String>> = None;
        let applied = self.tree.try_map(&mut |_, rows: &Vec<usize>| {
            let table = f(&self.group_frame(rows)?)?;
            let columns = NdFrame::columns(&table).to_vec();
            match &result_columns {
                Some(expected) if *expected != columns => {
                    return Err(GroupByError::InconsistentApply {
                        expected: expected.clone(),
                        actual: columns,
                    });
                }
                Some(_) => {}
                None => result_columns = Some(columns),
            }
            Ok(table.to_rows())
        })?;
        let rows = applied.flatten();

        let mut names = self.keys.clone();
        names.extend(result_columns.unwrap_or_default());
        let mut dtypes = infer_dtypes(&rows, names.len(), self.frame.config().dtype_sample_limit);
        dtypes[..self.keys.len()].copy_from_slice(&self.key_dtypes()?);

        let n_rows = rows.len();
        Ok(DataFrame::from_parts(
            rows,
            Index::range(n_rows),
            names,
            dtypes,
            *self.frame.config(),
        )?)
    }
}

/// Output rows of one group, without its key values.
fn leaf_rows(rows: &[usize], targets: &[Target<'_>]) -> Vec<Vec<Scalar>> {
    let results: Vec<AggValue> = targets
        .iter()
        .map(|target| {
            let values: Vec<Scalar> = rows.iter().map(|&row| target.values[row].clone()).collect();
            target.op.evaluate(&values, target.dtype)
        })
        .collect();
    let height = results
        .iter()
        .filter_map(|result| match result {
            AggValue::Cumulative(values) => Some(values.len()),
            AggValue::Scalar(_) => None,
        })
        .max()
        .unwrap_or(1);
    (0..height)
        .map(|i| {
            results
                .iter()
                .map(|result| match result {
                    AggValue::Scalar(value) => value.clone(),
                    AggValue::Cumulative(values) => values[i].clone(),
                })
                .collect()
        })
        .collect()
}
