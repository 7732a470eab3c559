//! Sampled dtype inference.
//!
//! Only the first `sample_limit` values of a column are inspected. A column
//! whose sampled prefix is numeric keeps a numeric dtype even if later values
//! are not; inference never scans past the sample.

use crate::{DType, Scalar, parse_numeric};

pub const DEFAULT_DTYPE_SAMPLE_LIMIT: usize = 10;

/// Tracker a single sampled value falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Bool,
    Float,
    Int,
    Utf8,
}

/// Classify one value. Precedence: boolean, non-string missing/NaN, numeric
/// with a decimal point, integer-looking numeric, everything else.
#[must_use]
pub fn classify_value(value: &Scalar) -> ValueClass {
    match value {
        Scalar::Bool(_) => ValueClass::Bool,
        Scalar::Null(_) | Scalar::Float64(_) => ValueClass::Float,
        Scalar::Int64(_) => ValueClass::Int,
        Scalar::Utf8(raw) => match parse_numeric(raw) {
            Some(_) if raw.contains('.') => ValueClass::Float,
            Some(_) => ValueClass::Int,
            None => ValueClass::Utf8,
        },
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Trackers {
    float: bool,
    int: bool,
    utf8: bool,
    boolean: bool,
}

impl Trackers {
    fn observe(&mut self, value: &Scalar) {
        match classify_value(value) {
            ValueClass::Bool => self.boolean = true,
            ValueClass::Float => self.float = true,
            ValueClass::Int => self.int = true,
            ValueClass::Utf8 => self.utf8 = true,
        }
    }

    fn resolve(self) -> DType {
        if self.utf8 {
            DType::Utf8
        } else if self.float {
            DType::Float64
        } else if self.int {
            DType::Int64
        } else if self.boolean {
            DType::Bool
        } else {
            DType::Undefined
        }
    }
}

/// Infer the dtype of one column from its first `sample_limit` values.
#[must_use]
pub fn infer_dtype(values: &[Scalar], sample_limit: usize) -> DType {
    let mut trackers = Trackers::default();
    for value in values.iter().take(sample_limit) {
        trackers.observe(value);
    }
    let dtype = trackers.resolve();
    log::trace!(
        "inferred {dtype} from {} of {} values",
        values.len().min(sample_limit),
        values.len()
    );
    dtype
}

/// Infer one dtype per column of row-major data.
#[must_use]
pub fn infer_dtypes(rows: &[Vec<Scalar>], n_columns: usize, sample_limit: usize) -> Vec<DType> {
    (0..n_columns)
        .map(|col| {
            let mut trackers = Trackers::default();
            for row in rows.iter().take(sample_limit) {
                if let Some(value) = row.get(col) {
                    trackers.observe(value);
                }
            }
            trackers.resolve()
        })
        .collect()
}
