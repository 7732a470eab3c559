use std::fmt;
use std::str::FromStr;

use nd_frame::cumulative_column;
use nd_types::{
    CumulativeOp, DType, Scalar, nancount, nanmax, nanmean, nanmin, nanmode, nanstd, nansum,
    nanvar, retype_integral,
};

use crate::GroupByError;

/// Aggregation applied to one target column within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggOp {
    Count,
    Sum,
    Mean,
    Std,
    Var,
    Mode,
    Min,
    Max,
    CumSum,
    CumProd,
    CumMax,
    CumMin,
}

/// Result of one operation over one group's values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AggValue {
    Scalar(Scalar),
    /// One value per group row.
    Cumulative(Vec<Scalar>),
}

impl AggOp {
    pub const ALL: [Self; 12] = [
        Self::Count,
        Self::Sum,
        Self::Mean,
        Self::Std,
        Self::Var,
        Self::Mode,
        Self::Min,
        Self::Max,
        Self::CumSum,
        Self::CumProd,
        Self::CumMax,
        Self::CumMin,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Std => "std",
            Self::Var => "var",
            Self::Mode => "mode",
            Self::Min => "min",
            Self::Max => "max",
            Self::CumSum => "cumsum",
            Self::CumProd => "cumprod",
            Self::CumMax => "cummax",
            Self::CumMin => "cummin",
        }
    }

    #[must_use]
    pub fn is_cumulative(self) -> bool {
        self.cumulative_op().is_some()
    }

    /// `count` and `mode` accept any dtype.
    #[must_use]
    pub fn requires_numeric(self) -> bool {
        !matches!(self, Self::Count | Self::Mode)
    }

    /// Output column name: cumulative results keep the source name.
    #[must_use]
    pub fn output_name(self, column: &str) -> String {
        if self.is_cumulative() {
            column.to_owned()
        } else {
            format!("{column}_{}", self.name())
        }
    }

    fn cumulative_op(self) -> Option<CumulativeOp> {
        match self {
            Self::CumSum => Some(CumulativeOp::Sum),
            Self::CumProd => Some(CumulativeOp::Prod),
            Self::CumMax => Some(CumulativeOp::Max),
            Self::CumMin => Some(CumulativeOp::Min),
            _ => None,
        }
    }

    pub(crate) fn evaluate(self, values: &[Scalar], source: DType) -> AggValue {
        let scalar = match self {
            Self::Count => nancount(values),
            Self::Sum => retype_integral(nansum(values), source),
            Self::Mean => nanmean(values),
            Self::Std => nanstd(values, 1),
            Self::Var => nanvar(values, 1),
            Self::Mode => nanmode(values),
            Self::Min => retype_integral(nanmin(values), source),
            Self::Max => retype_integral(nanmax(values), source),
            Self::CumSum | Self::CumProd | Self::CumMax | Self::CumMin => {
                let op = self.cumulative_op().unwrap_or(CumulativeOp::Sum);
                return AggValue::Cumulative(cumulative_column(values, source, op).into_values());
            }
        };
        AggValue::Scalar(scalar)
    }

    /// Dtype of the output column given every value it ended up holding.
    pub(crate) fn output_dtype<'a>(
        self,
        source: DType,
        mut values: impl Iterator<Item = &'a Scalar>,
    ) -> DType {
        let integral = matches!(source, DType::Int64 | DType::Bool);
        match self {
            Self::Count => DType::Int64,
            Self::Mean | Self::Std | Self::Var => DType::Float64,
            Self::Mode => {
                if integral && values.any(Scalar::is_missing) {
                    DType::Float64
                } else {
                    source
                }
            }
            Self::Sum
            | Self::Min
            | Self::Max
            | Self::CumSum
            | Self::CumProd
            | Self::CumMax
            | Self::CumMin => {
                if integral && values.all(|v| matches!(v, Scalar::Int64(_))) {
                    DType::Int64
                } else {
                    DType::Float64
                }
            }
        }
    }
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggOp {
    type Err = GroupByError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| GroupByError::OperationNotFound {
                name: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use nd_types::{DType, ErrorKind, Scalar};

    use super::{AggOp, AggValue};

    #[test]
    fn names_round_trip_through_from_str() {
        for op in AggOp::ALL {
            assert_eq!(AggOp::from_str(op.name()).expect("known"), op);
        }
        let err = AggOp::from_str("mean()").expect_err("call syntax is not a name");
        assert_eq!(err.kind(), ErrorKind::OperationNotFound);
    }

    #[test]
    fn output_names() {
        assert_eq!(AggOp::Sum.output_name("sales"), "sales_sum");
        assert_eq!(AggOp::CumMax.output_name("sales"), "sales");
    }

    #[test]
    fn integral_sums_stay_integral() {
        let values = [Scalar::Int64(2), Scalar::nan(), Scalar::Int64(5)];
        assert_eq!(
            AggOp::Sum.evaluate(&values, DType::Int64),
            AggValue::Scalar(Scalar::Int64(7))
        );
        assert_eq!(
            AggOp::Count.evaluate(&values, DType::Int64),
            AggValue::Scalar(Scalar::Int64(2))
        );
        assert_eq!(
            AggOp::CumSum.evaluate(&values, DType::Int64),
            AggValue::Cumulative(vec![Scalar::Float64(2.0), Scalar::nan(), Scalar::Float64(7.0)])
        );
    }

    #[test]
    fn output_dtypes() {
        let ints = [Scalar::Int64(1)];
        assert_eq!(AggOp::Max.output_dtype(DType::Int64, ints.iter()), DType::Int64);
        assert_eq!(AggOp::Mean.output_dtype(DType::Int64, ints.iter()), DType::Float64);
        let with_gap = [Scalar::Int64(1), Scalar::nan()];
        assert_eq!(AggOp::Mode.output_dtype(DType::Int64, with_gap.iter()), DType::Float64);
        assert_eq!(AggOp::Count.output_dtype(DType::Utf8, with_gap.iter()), DType::Int64);
    }
}
