//! Missingness helpers and nan-skipping reductions.
//!
//! This is the statistics boundary the frame and groupby layers call into:
//! every reduction takes a flat slice of scalars, skips missing values and
//! never fails.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{DType, Scalar};

// ── Missingness utilities ──────────────────────────────────────────────

pub fn isna(values: &[Scalar]) -> Vec<bool> {
    values.iter().map(Scalar::is_missing).collect()
}

pub fn notna(values: &[Scalar]) -> Vec<bool> {
    values.iter().map(|v| !v.is_missing()).collect()
}

pub fn count_na(values: &[Scalar]) -> usize {
    values.iter().filter(|v| v.is_missing()).count()
}

pub fn fill_na(values: &[Scalar], fill: &Scalar) -> Vec<Scalar> {
    values
        .iter()
        .map(|v| {
            if v.is_missing() {
                fill.clone()
            } else {
                v.clone()
            }
        })
        .collect()
}

pub fn dropna(values: &[Scalar]) -> Vec<Scalar> {
    values.iter().filter(|v| !v.is_missing()).cloned().collect()
}

// ── Nanops ─────────────────────────────────────────────────────────────

fn collect_numeric(values: &[Scalar]) -> Vec<f64> {
    values
        .iter()
        .filter(|v| !v.is_missing())
        .filter_map(|v| v.coerce_f64().ok())
        .collect()
}

/// Present values as integers, when every one of them is an integer or a
/// boolean. `None` for an empty input.
fn collect_integral(values: &[Scalar]) -> Option<Vec<i64>> {
    let ints: Vec<i64> = values
        .iter()
        .filter(|v| !v.is_missing())
        .map(|v| match v {
            Scalar::Int64(n) => Some(*n),
            Scalar::Bool(b) => Some(i64::from(*b)),
            _ => None,
        })
        .collect::<Option<_>>()?;
    (!ints.is_empty()).then_some(ints)
}

/// Integer inputs sum exactly in `i64`; overflow falls back to `f64`.
pub fn nansum(values: &[Scalar]) -> Scalar {
    if let Some(ints) = collect_integral(values)
        && let Some(total) = ints.iter().try_fold(0i64, |acc, n| acc.checked_add(*n))
    {
        return Scalar::Int64(total);
    }
    let nums = collect_numeric(values);
    Scalar::Float64(nums.iter().sum())
}

pub fn nanmean(values: &[Scalar]) -> Scalar {
    let nums = collect_numeric(values);
    if nums.is_empty() {
        return Scalar::nan();
    }
    let sum: f64 = nums.iter().sum();
    Scalar::Float64(sum / nums.len() as f64)
}

pub fn nancount(values: &[Scalar]) -> Scalar {
    let n = values.iter().filter(|v| !v.is_missing()).count();
    Scalar::Int64(n as i64)
}

pub fn nanmin(values: &[Scalar]) -> Scalar {
    if let Some(min) = collect_integral(values).and_then(|ints| ints.into_iter().min()) {
        return Scalar::Int64(min);
    }
    let nums = collect_numeric(values);
    if nums.is_empty() {
        return Scalar::nan();
    }
    Scalar::Float64(nums.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn nanmax(values: &[Scalar]) -> Scalar {
    if let Some(max) = collect_integral(values).and_then(|ints| ints.into_iter().max()) {
        return Scalar::Int64(max);
    }
    let nums = collect_numeric(values);
    if nums.is_empty() {
        return Scalar::nan();
    }
    Scalar::Float64(nums.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn nanmedian(values: &[Scalar]) -> Scalar {
    let mut nums = collect_numeric(values);
    if nums.is_empty() {
        return Scalar::nan();
    }
    nums.sort_by(f64::total_cmp);
    let mid = nums.len() / 2;
    if nums.len().is_multiple_of(2) {
        Scalar::Float64((nums[mid - 1] + nums[mid]) / 2.0)
    } else {
        Scalar::Float64(nums[mid])
    }
}

pub fn nanvar(values: &[Scalar], ddof: usize) -> Scalar {
    let nums = collect_numeric(values);
    if nums.len() <= ddof {
        return Scalar::nan();
    }
    let mean: f64 = nums.iter().sum::<f64>() / nums.len() as f64;
    let sum_sq: f64 = nums.iter().map(|x| (x - mean).powi(2)).sum();
    Scalar::Float64(sum_sq / (nums.len() - ddof) as f64)
}

pub fn nanstd(values: &[Scalar], ddof: usize) -> Scalar {
    match nanvar(values, ddof) {
        Scalar::Float64(v) => Scalar::Float64(v.sqrt()),
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ModeKey<'a> {
    Bool(bool),
    Int64(i64),
    FloatBits(u64),
    Utf8(&'a str),
}

impl<'a> ModeKey<'a> {
    fn from_scalar(value: &'a Scalar) -> Option<Self> {
        match value {
            Scalar::Bool(v) => Some(Self::Bool(*v)),
            Scalar::Int64(v) => Some(Self::Int64(*v)),
            Scalar::Float64(v) if !v.is_nan() => Some(Self::FloatBits(v.to_bits())),
            Scalar::Utf8(v) => Some(Self::Utf8(v.as_str())),
            Scalar::Float64(_) | Scalar::Null(_) => None,
        }
    }
}

/// Most frequent non-missing value; ties go to the value seen first.
pub fn nanmode(values: &[Scalar]) -> Scalar {
    let mut counts = HashMap::<ModeKey<'_>, (usize, usize)>::new();
    for (pos, value) in values.iter().enumerate() {
        if let Some(key) = ModeKey::from_scalar(value) {
            counts.entry(key).or_insert((0, pos)).0 += 1;
        }
    }

    counts
        .into_values()
        .max_by(|(count_a, first_a), (count_b, first_b)| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map_or_else(Scalar::nan, |(_, first)| values[first].clone())
}

/// Running reductions that return one value per input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CumulativeOp {
    Sum,
    Prod,
    Max,
    Min,
}

/// Missing inputs stay missing in place; the running value carries over them.
pub fn cumulative(values: &[Scalar], op: CumulativeOp) -> Vec<Scalar> {
    let mut running: Option<f64> = None;
    values
        .iter()
        .map(|value| {
            if value.is_missing() {
                return Scalar::nan();
            }
            let Ok(current) = value.coerce_f64() else {
                return Scalar::nan();
            };
            let next = match (running, op) {
                (None, _) => current,
                (Some(acc), CumulativeOp::Sum) => acc + current,
                (Some(acc), CumulativeOp::Prod) => acc * current,
                (Some(acc), CumulativeOp::Max) => acc.max(current),
                (Some(acc), CumulativeOp::Min) => acc.min(current),
            };
            running = Some(next);
            Scalar::Float64(next)
        })
        .collect()
}

/// Narrow a float result back to `Int64` when the source column is integral,
/// and widen an integer result to `Float64` when it is not.
#[must_use]
pub fn retype_integral(result: Scalar, source: DType) -> Scalar {
    let integral = matches!(source, DType::Int64 | DType::Bool);
    match result {
        Scalar::Float64(v)
            if integral && v.is_finite() && v == v.trunc() && v.abs() < i64::MAX as f64 =>
        {
            Scalar::Int64(v as i64)
        }
        Scalar::Int64(v) if !integral => Scalar::Float64(v as f64),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CumulativeOp, cumulative, nancount, nanmax, nanmean, nanmedian, nanmin, nanmode, nanstd,
        nansum, nanvar, retype_integral,
    };
    use crate::{DType, NullKind, Scalar};

    fn spread() -> Vec<Scalar> {
        [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .map(Scalar::Float64)
            .collect()
    }

    #[test]
    fn nansum_skips_missing_and_parses_numeric_strings() {
        let vals = vec![
            Scalar::Float64(1.0),
            Scalar::Null(NullKind::Null),
            Scalar::from("2"),
            Scalar::nan(),
            Scalar::Int64(7),
        ];
        assert_eq!(nansum(&vals), Scalar::Float64(10.0));
        assert_eq!(nansum(&[]), Scalar::Float64(0.0));
    }

    #[test]
    fn integer_reductions_stay_exact_past_f64_precision() {
        let big = (1i64 << 53) + 1;
        let vals = vec![Scalar::Int64(big), Scalar::nan(), Scalar::Int64(2)];
        assert_eq!(nansum(&vals), Scalar::Int64(big + 2));
        assert_eq!(nanmax(&vals), Scalar::Int64(big));
        assert_eq!(nanmin(&[Scalar::Int64(-big), Scalar::Int64(0)]), Scalar::Int64(-big));
        assert_eq!(
            nansum(&[Scalar::Int64(i64::MAX), Scalar::Int64(1)]),
            Scalar::Float64(i64::MAX as f64 + 1.0)
        );
        assert_eq!(
            retype_integral(nansum(&vals), DType::Int64),
            Scalar::Int64(big + 2)
        );
    }

    #[test]
    fn nanmean_all_missing_is_nan() {
        let vals = vec![Scalar::Null(NullKind::Null), Scalar::Float64(f64::NAN)];
        assert!(nanmean(&vals).is_missing());
        assert_eq!(
            nanmean(&[Scalar::Int64(2), Scalar::Int64(4)]),
            Scalar::Float64(3.0)
        );
    }

    #[test]
    fn nancount_counts_non_missing() {
        let vals = vec![
            Scalar::Int64(1),
            Scalar::Null(NullKind::Undefined),
            Scalar::from("a"),
        ];
        assert_eq!(nancount(&vals), Scalar::Int64(2));
    }

    #[test]
    fn min_max_median() {
        let vals = vec![
            Scalar::Float64(5.0),
            Scalar::nan(),
            Scalar::Float64(2.0),
            Scalar::Float64(8.0),
        ];
        assert_eq!(nanmin(&vals), Scalar::Float64(2.0));
        assert_eq!(nanmax(&vals), Scalar::Float64(8.0));
        assert_eq!(nanmedian(&vals), Scalar::Float64(5.0));
        assert!(nanmin(&[]).is_missing());
    }

    #[test]
    fn sample_and_population_variance() {
        let Scalar::Float64(pop) = nanvar(&spread(), 0) else {
            panic!("expected Float64");
        };
        assert!((pop - 4.0).abs() < 1e-10);

        let Scalar::Float64(sample) = nanvar(&spread(), 1) else {
            panic!("expected Float64");
        };
        assert!((sample - 32.0 / 7.0).abs() < 1e-10);

        let Scalar::Float64(std) = nanstd(&spread(), 0) else {
            panic!("expected Float64");
        };
        assert!((std - 2.0).abs() < 1e-10);

        assert!(nanvar(&[Scalar::Float64(5.0)], 1).is_missing());
    }

    #[test]
    fn mode_prefers_first_seen_on_ties() {
        let vals = vec![
            Scalar::from("b"),
            Scalar::from("a"),
            Scalar::from("a"),
            Scalar::from("b"),
            Scalar::nan(),
        ];
        assert_eq!(nanmode(&vals), Scalar::from("b"));
        let vals = vec![Scalar::Int64(3), Scalar::Int64(1), Scalar::Int64(1)];
        assert_eq!(nanmode(&vals), Scalar::Int64(1));
        assert!(nanmode(&[Scalar::nan()]).is_missing());
    }

    #[test]
    fn cumulative_ops_carry_over_missing() {
        let vals = vec![
            Scalar::Int64(1),
            Scalar::nan(),
            Scalar::Int64(3),
            Scalar::Int64(2),
        ];
        assert_eq!(
            cumulative(&vals, CumulativeOp::Sum),
            vec![
                Scalar::Float64(1.0),
                Scalar::nan(),
                Scalar::Float64(4.0),
                Scalar::Float64(6.0)
            ]
        );
        assert_eq!(
            cumulative(&vals, CumulativeOp::Prod)[3],
            Scalar::Float64(6.0)
        );
        assert_eq!(cumulative(&vals, CumulativeOp::Max)[3], Scalar::Float64(3.0));
        assert_eq!(cumulative(&vals, CumulativeOp::Min)[3], Scalar::Float64(1.0));
    }

    #[test]
    fn retype_integral_only_narrows_integral_sources() {
        assert_eq!(
            retype_integral(Scalar::Float64(4.0), DType::Int64),
            Scalar::Int64(4)
        );
        assert_eq!(
            retype_integral(Scalar::Float64(4.5), DType::Int64),
            Scalar::Float64(4.5)
        );
        assert_eq!(
            retype_integral(Scalar::Float64(4.0), DType::Float64),
            Scalar::Float64(4.0)
        );
        assert_eq!(
            retype_integral(Scalar::Int64(4), DType::Float64),
            Scalar::Float64(4.0)
        );
    }
}
