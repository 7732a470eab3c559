#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod infer;
mod stats;

pub use infer::{DEFAULT_DTYPE_SAMPLE_LIMIT, ValueClass, classify_value, infer_dtype, infer_dtypes};
pub use stats::{
    CumulativeOp, count_na, cumulative, dropna, fill_na, isna, nancount, nanmax, nanmean,
    nanmedian, nanmin, nanmode, nanstd, nansum, nanvar, notna, retype_integral,
};

/// Per-column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Float64,
    Int64,
    Utf8,
    Bool,
    Undefined,
}

impl DType {
    /// Canonical tag used by `Display` and accepted by `FromStr`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Float64 => "float64",
            Self::Int64 => "int64",
            Self::Utf8 => "string",
            Self::Bool => "boolean",
            Self::Undefined => "undefined",
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Float64 | Self::Int64 | Self::Bool)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DType {
    type Err = TypeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "float" | "float32" | "float64" => Ok(Self::Float64),
            "int" | "int32" | "int64" => Ok(Self::Int64),
            "string" | "str" | "utf8" => Ok(Self::Utf8),
            "boolean" | "bool" => Ok(Self::Bool),
            "undefined" => Ok(Self::Undefined),
            other => Err(TypeError::UnsupportedDtype {
                tag: other.to_owned(),
            }),
        }
    }
}

/// Flavour of an empty value. Only `NaN` is the numeric missing marker;
/// all three count as empty for the missingness predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullKind {
    Null,
    NaN,
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Null(NullKind),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl Scalar {
    /// The tag this single value would carry on its own.
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Null(NullKind::NaN) => DType::Float64,
            Self::Null(_) => DType::Undefined,
            Self::Bool(_) => DType::Bool,
            Self::Int64(_) => DType::Int64,
            Self::Float64(_) => DType::Float64,
            Self::Utf8(_) => DType::Utf8,
        }
    }

    #[must_use]
    pub fn nan() -> Self {
        Self::Null(NullKind::NaN)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null(_) => true,
            Self::Float64(v) => v.is_nan(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Null(NullKind::NaN)) || matches!(self, Self::Float64(v) if v.is_nan())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float64(a), Self::Float64(b)) => (a.is_nan() && b.is_nan()) || (a == b),
            (Self::Null(NullKind::NaN), Self::Float64(v))
            | (Self::Float64(v), Self::Null(NullKind::NaN)) => v.is_nan(),
            _ => self == other,
        }
    }

    pub fn to_f64(&self) -> Result<f64, TypeError> {
        match self {
            Self::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
            Self::Int64(v) => Ok(*v as f64),
            Self::Float64(v) => Ok(*v),
            Self::Null(kind) => Err(TypeError::ValueIsMissing { kind: *kind }),
            Self::Utf8(v) => Err(TypeError::NonNumericValue {
                value: v.clone(),
                dtype: DType::Utf8,
            }),
        }
    }

    /// Like [`Scalar::to_f64`], but numeric-looking strings are parsed.
    ///
    /// Columns keep their raw values after inference, so an `int64` column may
    /// legitimately hold `Utf8("4")`.
    pub fn coerce_f64(&self) -> Result<f64, TypeError> {
        match self {
            Self::Utf8(v) => match parse_numeric(v) {
                Some(parsed) => Ok(parsed),
                None => Err(TypeError::NonNumericValue {
                    value: v.clone(),
                    dtype: DType::Utf8,
                }),
            },
            other => other.to_f64(),
        }
    }
}

/// Parse a string as a finite number the way the inferencer does.
#[must_use]
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null(NullKind::NaN) => f.write_str("NaN"),
            Self::Null(NullKind::Null) => f.write_str("null"),
            Self::Null(NullKind::Undefined) => f.write_str("undefined"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) if v.is_nan() => f.write_str("NaN"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => f.write_str(v),
        }
    }
}

/// Error taxonomy shared by every crate in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    Shape,
    DuplicateLabel,
    Index,
    ColumnIndex,
    Range,
    Type,
    OperationNotFound,
    ColumnNotFound,
    DtypeNotSupported,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("dtype '{tag}' is not supported")]
    UnsupportedDtype { tag: String },
    #[error("operation requires a numeric dtype but found {dtype}")]
    NonNumericDtype { dtype: DType },
    #[error("value {value:?} has non-numeric dtype {dtype}")]
    NonNumericValue { value: String, dtype: DType },
    #[error("value is missing ({kind:?})")]
    ValueIsMissing { kind: NullKind },
}

impl TypeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedDtype { .. } | Self::NonNumericDtype { .. } => {
                ErrorKind::DtypeNotSupported
            }
            Self::NonNumericValue { .. } | Self::ValueIsMissing { .. } => ErrorKind::Type,
        }
    }
}
