//! Elementwise arithmetic, comparisons and reductions.
//!
//! The numeric work happens in `nd-columnar` and `nd-types`; this module only
//! walks containers column by column and rebuilds them.

use nd_columnar::{ArithmeticOp, Column, ColumnError, ComparisonOp};
use nd_types::{
    CumulativeOp, DType, Scalar, TypeError, cumulative, nancount, nanmax, nanmean, nanmedian,
    nanmin, nanmode, nanstd, nansum, nanvar, retype_integral,
};

use crate::{DataFrame, FrameError, Series};

/// Right-hand side of a frame operation.
///
/// A series is broadcast across columns: its `i`-th value applies to the
/// `i`-th column.
#[derive(Debug, Clone)]
pub enum Operand<'a> {
    Scalar(Scalar),
    Series(&'a Series),
    Frame(&'a DataFrame),
}

impl From<Scalar> for Operand<'_> {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for Operand<'_> {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int64(value))
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float64(value))
    }
}

impl<'a> From<&'a Series> for Operand<'a> {
    fn from(value: &'a Series) -> Self {
        Self::Series(value)
    }
}

impl<'a> From<&'a DataFrame> for Operand<'a> {
    fn from(value: &'a DataFrame) -> Self {
        Self::Frame(value)
    }
}

/// Right-hand side of a series operation; series operands pair by position.
#[derive(Debug, Clone)]
pub enum SeriesOperand<'a> {
    Scalar(Scalar),
    Series(&'a Series),
}

impl From<Scalar> for SeriesOperand<'_> {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for SeriesOperand<'_> {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int64(value))
    }
}

impl From<f64> for SeriesOperand<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float64(value))
    }
}

impl<'a> From<&'a Series> for SeriesOperand<'a> {
    fn from(value: &'a Series) -> Self {
        Self::Series(value)
    }
}

/// Running reduction over `values`, keeping integers for integral sources.
#[must_use]
pub fn cumulative_column(values: &[Scalar], dtype: DType, op: CumulativeOp) -> Column {
    let running = cumulative(values, op);
    if matches!(dtype, DType::Int64 | DType::Bool) {
        let narrowed: Vec<Scalar> = running
            .iter()
            .map(|v| retype_integral(v.clone(), dtype))
            .collect();
        if narrowed.iter().all(|v| matches!(v, Scalar::Int64(_))) {
            return Column::new(DType::Int64, narrowed);
        }
    }
    Column::new(DType::Float64, running)
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Arithmetic(ArithmeticOp),
    Comparison(ComparisonOp),
}

impl Step {
    fn with_scalar(self, left: &Column, right: &Scalar) -> Result<Column, ColumnError> {
        match self {
            Self::Arithmetic(op) => left.scalar_numeric(right, op),
            Self::Comparison(op) => left.compare_scalar(right, op),
        }
    }

    fn with_column(self, left: &Column, right: &Column) -> Result<Column, ColumnError> {
        match self {
            Self::Arithmetic(op) => left.binary_numeric(right, op),
            Self::Comparison(op) => left.binary_comparison(right, op),
        }
    }
}

impl DataFrame {
    fn zip_columns(&self, other: Operand<'_>, step: Step) -> Result<Self, FrameError> {
        let (n_rows, n_cols) = self.shape();
        let left = self.column_pairs();
        let out = match other {
            Operand::Scalar(value) => left
                .into_iter()
                .map(|(name, column)| Ok((name, step.with_scalar(&column, &value)?)))
                .collect::<Result<Vec<_>, FrameError>>()?,
            Operand::Series(series) => {
                if series.len() != n_cols {
                    return Err(FrameError::shape("series operand", n_cols, series.len()));
                }
                left.into_iter()
                    .zip(series.values())
                    .map(|((name, column), value)| Ok((name, step.with_scalar(&column, value)?)))
                    .collect::<Result<Vec<_>, FrameError>>()?
            }
            Operand::Frame(frame) => {
                let (rows, cols) = frame.shape();
                if rows != n_rows {
                    return Err(FrameError::shape("frame operand rows", n_rows, rows));
                }
                if cols != n_cols {
                    return Err(FrameError::shape("frame operand columns", n_cols, cols));
                }
                left.into_iter()
                    .zip(frame.column_pairs())
                    .map(|((name, column), (_, right))| {
                        Ok((name, step.with_column(&column, &right)?))
                    })
                    .collect::<Result<Vec<_>, FrameError>>()?
            }
        };
        DataFrame::from_columns(self.index().clone(), out, *self.config())
    }

    pub fn arithmetic<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        op: ArithmeticOp,
    ) -> Result<Self, FrameError> {
        self.zip_columns(other.into(), Step::Arithmetic(op))
    }

    /// Boolean frame of `self <op> other`.
    pub fn comparison<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        op: ComparisonOp,
    ) -> Result<Self, FrameError> {
        self.zip_columns(other.into(), Step::Comparison(op))
    }

    pub fn add<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Add)
    }

    pub fn sub<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Sub)
    }

    pub fn mul<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Mul)
    }

    pub fn div<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Div)
    }

    pub fn modulo<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Mod)
    }

    pub fn pow<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Pow)
    }

    pub fn gt<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Gt)
    }

    pub fn lt<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Lt)
    }

    pub fn ge<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Ge)
    }

    pub fn le<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Le)
    }

    pub fn eq<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Eq)
    }

    pub fn ne<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Ne)
    }
}

impl Series {
    pub fn arithmetic<'a>(
        &self,
        other: impl Into<SeriesOperand<'a>>,
        op: ArithmeticOp,
    ) -> Result<Self, FrameError> {
        let column = self.column();
        let out = match other.into() {
            SeriesOperand::Scalar(value) => column.scalar_numeric(&value, op)?,
            SeriesOperand::Series(right) => column.binary_numeric(&right.column(), op)?,
        };
        self.with_column_data(out)
    }

    pub fn comparison<'a>(
        &self,
        other: impl Into<SeriesOperand<'a>>,
        op: ComparisonOp,
    ) -> Result<Self, FrameError> {
        let column = self.column();
        let out = match other.into() {
            SeriesOperand::Scalar(value) => column.compare_scalar(&value, op)?,
            SeriesOperand::Series(right) => column.binary_comparison(&right.column(), op)?,
        };
        self.with_column_data(out)
    }

    pub fn add<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Add)
    }

    pub fn sub<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Sub)
    }

    pub fn mul<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Mul)
    }

    pub fn div<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Div)
    }

    pub fn modulo<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Mod)
    }

    pub fn pow<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.arithmetic(other, ArithmeticOp::Pow)
    }

    pub fn gt<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Gt)
    }

    pub fn lt<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Lt)
    }

    pub fn ge<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Ge)
    }

    pub fn le<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Le)
    }

    pub fn eq<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Eq)
    }

    pub fn ne<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.comparison(other, ComparisonOp::Ne)
    }

    fn numeric_values(&self) -> Result<&[Scalar], FrameError> {
        let dtype = self.dtype();
        if dtype.is_numeric() || dtype == DType::Undefined {
            Ok(self.values())
        } else {
            Err(TypeError::NonNumericDtype { dtype }.into())
        }
    }

    pub fn sum(&self) -> Result<Scalar, FrameError> {
        Ok(retype_integral(nansum(self.numeric_values()?), self.dtype()))
    }

    pub fn mean(&self) -> Result<Scalar, FrameError> {
        Ok(nanmean(self.numeric_values()?))
    }

    pub fn median(&self) -> Result<Scalar, FrameError> {
        Ok(nanmedian(self.numeric_values()?))
    }

    /// Sample standard deviation.
    pub fn std(&self) -> Result<Scalar, FrameError> {
        Ok(nanstd(self.numeric_values()?, 1))
    }

    /// Sample variance.
    pub fn var(&self) -> Result<Scalar, FrameError> {
        Ok(nanvar(self.numeric_values()?, 1))
    }

    pub fn min(&self) -> Result<Scalar, FrameError> {
        Ok(retype_integral(nanmin(self.numeric_values()?), self.dtype()))
    }

    pub fn max(&self) -> Result<Scalar, FrameError> {
        Ok(retype_integral(nanmax(self.numeric_values()?), self.dtype()))
    }

    #[must_use]
    pub fn mode(&self) -> Scalar {
        nanmode(self.values())
    }

    /// Non-missing values.
    #[must_use]
    pub fn count(&self) -> Scalar {
        nancount(self.values())
    }

    pub fn cumulative(&self, op: CumulativeOp) -> Result<Self, FrameError> {
        let values = self.numeric_values()?;
        self.with_column_data(cumulative_column(values, self.dtype(), op))
    }

    pub fn cumsum(&self) -> Result<Self, FrameError> {
        self.cumulative(CumulativeOp::Sum)
    }

    pub fn cumprod(&self) -> Result<Self, FrameError> {
        self.cumulative(CumulativeOp::Prod)
    }

    pub fn cummax(&self) -> Result<Self, FrameError> {
        self.cumulative(CumulativeOp::Max)
    }

    pub fn cummin(&self) -> Result<Self, FrameError> {
        self.cumulative(CumulativeOp::Min)
    }
}
