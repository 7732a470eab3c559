#![forbid(unsafe_code)]

use nd_types::{DType, ErrorKind, Scalar, TypeError, infer_dtype};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single column of raw values plus the dtype tag the frame assigned it.
///
/// Values are not coerced on construction; the dtype is a tag, so a column
/// tagged `int64` may hold numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    dtype: DType,
    values: Vec<Scalar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Element-wise comparison operations that produce `Bool`-typed columns.
///
/// A missing operand compares false, except under `Ne` where it is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Gt,
    Lt,
    Eq,
    Ne,
    Ge,
    Le,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnError {
    #[error("column length mismatch: left={left}, right={right}")]
    LengthMismatch { left: usize, right: usize },
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl ColumnError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LengthMismatch { .. } => ErrorKind::Shape,
            Self::Type(err) => err.kind(),
        }
    }
}

/// Undefined columns hold only missing values and pass through as NaN.
fn ensure_numeric(dtype: DType) -> Result<(), TypeError> {
    if dtype.is_numeric() || dtype == DType::Undefined {
        Ok(())
    } else {
        Err(TypeError::NonNumericDtype { dtype })
    }
}

fn arithmetic_dtype(left: DType, right: DType, op: ArithmeticOp) -> DType {
    match op {
        ArithmeticOp::Div => DType::Float64,
        _ if left == DType::Float64 || right == DType::Float64 => DType::Float64,
        _ => DType::Int64,
    }
}

/// An integral op whose results left the integers (`2 ** -1`, missing) is float.
fn settle_dtype(out_dtype: DType, values: &[Scalar]) -> DType {
    if out_dtype == DType::Int64
        && values
            .iter()
            .any(|v| matches!(v, Scalar::Float64(_) | Scalar::Null(_)))
    {
        DType::Float64
    } else {
        out_dtype
    }
}

fn apply_arithmetic(lhs: f64, rhs: f64, op: ArithmeticOp) -> f64 {
    match op {
        ArithmeticOp::Add => lhs + rhs,
        ArithmeticOp::Sub => lhs - rhs,
        ArithmeticOp::Mul => lhs * rhs,
        ArithmeticOp::Div => lhs / rhs,
        // Floored modulo: the result takes the sign of the divisor.
        ArithmeticOp::Mod if rhs == 0.0 => f64::NAN,
        ArithmeticOp::Mod => lhs - rhs * (lhs / rhs).floor(),
        ArithmeticOp::Pow => lhs.powf(rhs),
    }
}

fn scalar_arithmetic(
    left: &Scalar,
    right: &Scalar,
    op: ArithmeticOp,
    out_dtype: DType,
) -> Result<Scalar, TypeError> {
    if left.is_missing() || right.is_missing() {
        return Ok(Scalar::nan());
    }

    let result = apply_arithmetic(left.coerce_f64()?, right.coerce_f64()?, op);
    if out_dtype == DType::Int64
        && result.is_finite()
        && result == result.trunc()
        && result >= i64::MIN as f64
        && result <= i64::MAX as f64
    {
        Ok(Scalar::Int64(result as i64))
    } else if result.is_nan() {
        Ok(Scalar::nan())
    } else {
        Ok(Scalar::Float64(result))
    }
}

/// Compare two present values. Strings order lexicographically, booleans
/// `false < true`, everything else numerically.
pub fn scalar_compare(left: &Scalar, right: &Scalar, op: ComparisonOp) -> Result<bool, TypeError> {
    if left.is_missing() || right.is_missing() {
        return Ok(op == ComparisonOp::Ne);
    }

    let ordering = match (left, right) {
        (Scalar::Utf8(a), Scalar::Utf8(b)) => a.cmp(b),
        (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
        _ => {
            let lhs = left.coerce_f64()?;
            let rhs = right.coerce_f64()?;
            lhs.total_cmp(&rhs)
        }
    };

    Ok(match op {
        ComparisonOp::Gt => ordering.is_gt(),
        ComparisonOp::Lt => ordering.is_lt(),
        ComparisonOp::Eq => ordering.is_eq(),
        ComparisonOp::Ne => ordering.is_ne(),
        ComparisonOp::Ge => ordering.is_ge(),
        ComparisonOp::Le => ordering.is_le(),
    })
}

/// Convert one value to `dtype`. Missing values pass through unchanged.
pub fn cast_scalar(value: &Scalar, dtype: DType) -> Result<Scalar, TypeError> {
    if value.is_missing() {
        return Ok(value.clone());
    }
    match dtype {
        DType::Float64 => value.coerce_f64().map(Scalar::Float64),
        DType::Int64 => match value {
            Scalar::Int64(v) => Ok(Scalar::Int64(*v)),
            other => {
                let v = other.coerce_f64()?;
                Ok(Scalar::Int64(v.trunc() as i64))
            }
        },
        DType::Bool => match value {
            Scalar::Bool(v) => Ok(Scalar::Bool(*v)),
            Scalar::Utf8(v) if v.eq_ignore_ascii_case("true") => Ok(Scalar::Bool(true)),
            Scalar::Utf8(v) if v.eq_ignore_ascii_case("false") => Ok(Scalar::Bool(false)),
            other => other.coerce_f64().map(|v| Scalar::Bool(v != 0.0)),
        },
        DType::Utf8 => Ok(Scalar::Utf8(value.to_string())),
        DType::Undefined => Ok(value.clone()),
    }
}

impl Column {
    #[must_use]
    pub fn new(dtype: DType, values: Vec<Scalar>) -> Self {
        Self { dtype, values }
    }

    /// Build a column and infer its dtype from the first `sample_limit` values.
    #[must_use]
    pub fn from_values(values: Vec<Scalar>, sample_limit: usize) -> Self {
        let dtype = infer_dtype(&values, sample_limit);
        Self::new(dtype, values)
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Scalar> {
        self.values
    }

    fn check_len(&self, right: &Self) -> Result<(), ColumnError> {
        if self.len() == right.len() {
            Ok(())
        } else {
            Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: right.len(),
            })
        }
    }

    pub fn binary_numeric(&self, right: &Self, op: ArithmeticOp) -> Result<Self, ColumnError> {
        self.check_len(right)?;
        ensure_numeric(self.dtype)?;
        ensure_numeric(right.dtype)?;

        let out_dtype = arithmetic_dtype(self.dtype, right.dtype, op);
        let values = self
            .values
            .iter()
            .zip(&right.values)
            .map(|(l, r)| scalar_arithmetic(l, r, op, out_dtype))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(settle_dtype(out_dtype, &values), values))
    }

    /// Broadcast `scalar` against every element.
    pub fn scalar_numeric(&self, scalar: &Scalar, op: ArithmeticOp) -> Result<Self, ColumnError> {
        ensure_numeric(self.dtype)?;
        let scalar_dtype = scalar.dtype();
        if !scalar.is_missing() {
            ensure_numeric(scalar_dtype)?;
        }

        let out_dtype = arithmetic_dtype(self.dtype, scalar_dtype, op);
        let values = self
            .values
            .iter()
            .map(|v| scalar_arithmetic(v, scalar, op, out_dtype))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(settle_dtype(out_dtype, &values), values))
    }

    pub fn binary_comparison(&self, right: &Self, op: ComparisonOp) -> Result<Self, ColumnError> {
        self.check_len(right)?;
        let values = self
            .values
            .iter()
            .zip(&right.values)
            .map(|(l, r)| scalar_compare(l, r, op).map(Scalar::Bool))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(DType::Bool, values))
    }

    pub fn compare_scalar(&self, scalar: &Scalar, op: ComparisonOp) -> Result<Self, ColumnError> {
        let values = self
            .values
            .iter()
            .map(|v| scalar_compare(v, scalar, op).map(Scalar::Bool))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(DType::Bool, values))
    }

    pub fn cast(&self, dtype: DType) -> Result<Self, ColumnError> {
        let values = self
            .values
            .iter()
            .map(|v| cast_scalar(v, dtype))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(dtype, values))
    }

    /// `true` where a value is present and boolean true. Missing is `false`.
    #[must_use]
    pub fn truthy_mask(&self) -> Vec<bool> {
        self.values
            .iter()
            .map(|v| matches!(v, Scalar::Bool(true)))
            .collect()
    }

    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(left, right)| left.semantic_eq(right))
    }
}

impl Default for Column {
    fn default() -> Self {
        Self::new(DType::Undefined, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use nd_types::{DType, ErrorKind, NullKind, Scalar};

    use super::{ArithmeticOp, Column, ComparisonOp, cast_scalar};

    fn ints(values: &[i64]) -> Column {
        Column::new(DType::Int64, values.iter().copied().map(Scalar::Int64).collect())
    }

    #[test]
    fn numeric_addition_propagates_missing() {
        let left = Column::new(
            DType::Float64,
            vec![
                Scalar::Int64(1),
                Scalar::Null(NullKind::Null),
                Scalar::Float64(f64::NAN),
            ],
        );
        let right = Column::new(
            DType::Float64,
            vec![Scalar::Int64(2), Scalar::Int64(3), Scalar::Int64(4)],
        );

        let out = left
            .binary_numeric(&right, ArithmeticOp::Add)
            .expect("numeric op should pass");

        assert_eq!(out.values()[0], Scalar::Float64(3.0));
        assert_eq!(out.values()[1], Scalar::nan());
        assert_eq!(out.values()[2], Scalar::nan());
    }

    #[test]
    fn integer_ops_stay_integral_except_division() {
        let left = ints(&[7, -7]);
        let right = ints(&[2, 2]);
        let sum = left.binary_numeric(&right, ArithmeticOp::Add).expect("add");
        assert_eq!(sum.dtype(), DType::Int64);
        assert_eq!(sum.values(), &[Scalar::Int64(9), Scalar::Int64(-5)]);

        let quotient = left.binary_numeric(&right, ArithmeticOp::Div).expect("div");
        assert_eq!(quotient.dtype(), DType::Float64);
        assert_eq!(quotient.values()[0], Scalar::Float64(3.5));
    }

    #[test]
    fn modulo_is_floored() {
        let out = ints(&[7, -7])
            .scalar_numeric(&Scalar::Int64(3), ArithmeticOp::Mod)
            .expect("mod");
        assert_eq!(out.values(), &[Scalar::Int64(1), Scalar::Int64(2)]);

        let out = ints(&[1])
            .scalar_numeric(&Scalar::Int64(0), ArithmeticOp::Mod)
            .expect("mod by zero");
        assert!(out.values()[0].is_missing());
    }

    #[test]
    fn pow_against_scalar() {
        let out = ints(&[2, 3])
            .scalar_numeric(&Scalar::Int64(2), ArithmeticOp::Pow)
            .expect("pow");
        assert_eq!(out.values(), &[Scalar::Int64(4), Scalar::Int64(9)]);

        let out = ints(&[2])
            .scalar_numeric(&Scalar::Int64(-1), ArithmeticOp::Pow)
            .expect("negative exponent");
        assert_eq!(out.dtype(), DType::Float64);
        assert_eq!(out.values(), &[Scalar::Float64(0.5)]);
    }

    #[test]
    fn numeric_strings_in_int_columns_are_parsed() {
        let column = Column::new(DType::Int64, vec![Scalar::Int64(1), Scalar::from("4")]);
        let out = column
            .scalar_numeric(&Scalar::Int64(1), ArithmeticOp::Add)
            .expect("parsed");
        assert_eq!(out.values(), &[Scalar::Int64(2), Scalar::Int64(5)]);
    }

    #[test]
    fn string_columns_reject_arithmetic() {
        let column = Column::new(DType::Utf8, vec![Scalar::from("a")]);
        let err = column
            .scalar_numeric(&Scalar::Int64(1), ArithmeticOp::Add)
            .expect_err("strings are not numeric");
        assert_eq!(err.kind(), ErrorKind::DtypeNotSupported);
    }

    #[test]
    fn length_mismatch_is_a_shape_error() {
        let err = ints(&[1, 2])
            .binary_numeric(&ints(&[1]), ArithmeticOp::Sub)
            .expect_err("lengths differ");
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn comparisons_treat_missing_as_false() {
        let column = Column::new(
            DType::Float64,
            vec![Scalar::Float64(1.0), Scalar::nan(), Scalar::Float64(3.0)],
        );
        let gt = column
            .compare_scalar(&Scalar::Int64(2), ComparisonOp::Gt)
            .expect("compare");
        assert_eq!(gt.truthy_mask(), vec![false, false, true]);

        let ne = column
            .compare_scalar(&Scalar::Int64(2), ComparisonOp::Ne)
            .expect("compare");
        assert_eq!(ne.truthy_mask(), vec![true, true, true]);
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        let left = Column::new(DType::Utf8, vec![Scalar::from("apple"), Scalar::from("b")]);
        let right = Column::new(DType::Utf8, vec![Scalar::from("banana"), Scalar::from("b")]);
        let lt = left
            .binary_comparison(&right, ComparisonOp::Lt)
            .expect("compare");
        assert_eq!(lt.dtype(), DType::Bool);
        assert_eq!(lt.truthy_mask(), vec![true, false]);
    }

    #[test]
    fn casts_follow_target_dtype() {
        assert_eq!(
            cast_scalar(&Scalar::from("2.7"), DType::Int64).expect("cast"),
            Scalar::Int64(2)
        );
        assert_eq!(
            cast_scalar(&Scalar::Int64(0), DType::Bool).expect("cast"),
            Scalar::Bool(false)
        );
        assert_eq!(
            cast_scalar(&Scalar::Float64(1.5), DType::Utf8).expect("cast"),
            Scalar::from("1.5")
        );
        assert!(cast_scalar(&Scalar::from("x"), DType::Float64).is_err());

        let column = Column::from_values(vec![Scalar::from("1"), Scalar::nan()], 10);
        assert_eq!(column.dtype(), DType::Float64);
        let cast = column.cast(DType::Int64).expect("cast");
        assert_eq!(cast.values(), &[Scalar::Int64(1), Scalar::nan()]);
    }
}
