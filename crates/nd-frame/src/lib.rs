#![forbid(unsafe_code)]

use std::fmt;

use nd_columnar::ColumnError;
use nd_index::{Index, IndexError};
use nd_types::{DType, ErrorKind, Scalar, TypeError};
use thiserror::Error;

mod config;
mod dataframe;
mod display;
mod indexing;
mod ops;
mod raw;
mod sample;
mod series;

pub use config::FrameConfig;
pub use dataframe::DataFrame;
pub use nd_columnar::{ArithmeticOp, Column, ComparisonOp};
pub use nd_index::{Axis, IndexLabel, IndexMode, Selector, SelectorItem};
pub use ops::{Operand, SeriesOperand, cumulative_column};
pub use raw::{FrameOptions, RawData};
pub use sample::{RandomShuffle, Shuffle};
pub use series::Series;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("unrecognized input: {0}")]
    Format(String),
    #[error("{what} has length {actual} but {expected} was expected")]
    Shape {
        what: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

impl FrameError {
    pub(crate) fn shape(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::Shape {
            what: what.into(),
            expected,
            actual,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::Shape { .. } => ErrorKind::Shape,
            Self::Index(err) => err.kind(),
            Self::Type(err) => err.kind(),
            Self::Column(err) => err.kind(),
        }
    }
}

/// Surface shared by one- and two-dimensional containers.
pub trait NdFrame {
    fn ndim(&self) -> usize;

    /// `(rows, columns)`; a series reports one column.
    fn shape(&self) -> (usize, usize);

    fn index(&self) -> &Index;

    fn columns(&self) -> &[String];

    fn dtypes(&self) -> &[DType];

    fn config(&self) -> &FrameConfig;

    /// Row-major copy of the data.
    fn to_rows(&self) -> Vec<Vec<Scalar>>;
}

/// Either container, as produced by raw-data construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Series(Series),
    Frame(DataFrame),
}

impl Table {
    /// Flat scalar input becomes a series; every other shape a frame.
    pub fn from_raw(data: RawData, options: FrameOptions) -> Result<Self, FrameError> {
        match data {
            RawData::Scalars(values) => Series::new(values, options).map(Self::Series),
            other => DataFrame::new(other, options).map(Self::Frame),
        }
    }

    pub fn from_json(value: &serde_json::Value, options: FrameOptions) -> Result<Self, FrameError> {
        Self::from_raw(RawData::from_json(value)?, options)
    }

    fn inner(&self) -> &dyn NdFrame {
        match self {
            Self::Series(series) => series,
            Self::Frame(frame) => frame,
        }
    }

    #[must_use]
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Self::Series(series) => Some(series),
            Self::Frame(_) => None,
        }
    }

    #[must_use]
    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Self::Frame(frame) => Some(frame),
            Self::Series(_) => None,
        }
    }

    /// Promote a series to a one-column frame.
    pub fn into_frame(self) -> Result<DataFrame, FrameError> {
        match self {
            Self::Frame(frame) => Ok(frame),
            Self::Series(series) => series.to_frame(),
        }
    }

    /// Position-based selection; the column selector is ignored for a series.
    pub fn iloc(&self, rows: &Selector, columns: &Selector) -> Result<Self, FrameError> {
        match self {
            Self::Series(series) => series.iloc(rows).map(Self::Series),
            Self::Frame(frame) => frame.iloc(rows, columns).map(Self::Frame),
        }
    }

    /// Label-based selection; the column selector is ignored for a series.
    pub fn loc(&self, rows: &Selector, columns: &Selector) -> Result<Self, FrameError> {
        match self {
            Self::Series(series) => series.loc(rows).map(Self::Series),
            Self::Frame(frame) => frame.loc(rows, columns).map(Self::Frame),
        }
    }
}

impl NdFrame for Table {
    fn ndim(&self) -> usize {
        self.inner().ndim()
    }

    fn shape(&self) -> (usize, usize) {
        self.inner().shape()
    }

    fn index(&self) -> &Index {
        match self {
            Self::Series(series) => series.index(),
            Self::Frame(frame) => frame.index(),
        }
    }

    fn columns(&self) -> &[String] {
        match self {
            Self::Series(series) => NdFrame::columns(series),
            Self::Frame(frame) => frame.columns(),
        }
    }

    fn dtypes(&self) -> &[DType] {
        match self {
            Self::Series(series) => NdFrame::dtypes(series),
            Self::Frame(frame) => frame.dtypes(),
        }
    }

    fn config(&self) -> &FrameConfig {
        match self {
            Self::Series(series) => series.config(),
            Self::Frame(frame) => frame.config(),
        }
    }

    fn to_rows(&self) -> Vec<Vec<Scalar>> {
        self.inner().to_rows()
    }
}

impl From<Series> for Table {
    fn from(value: Series) -> Self {
        Self::Series(value)
    }
}

impl From<DataFrame> for Table {
    fn from(value: DataFrame) -> Self {
        Self::Frame(value)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Series(series) => fmt::Display::fmt(series, f),
            Self::Frame(frame) => fmt::Display::fmt(frame, f),
        }
    }
}
