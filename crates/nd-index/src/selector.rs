//! Selector grammar shared by `iloc` and `loc`.
//!
//! A selector is either omitted (every position), a single `"start:end"`
//! slice string, or a list of items. Items are booleans, integers or
//! strings; how each one resolves depends on the [`IndexMode`] and the
//! [`Axis`] being addressed.

use std::ops::RangeInclusive;

use nd_types::Scalar;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Axis, Index, IndexError, IndexLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// `iloc`: integers are positions.
    Position,
    /// `loc`: integers and strings are labels.
    Label,
}

/// Raw bounds of a `"start:end"` slice string; an empty side is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceBounds {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl SliceBounds {
    /// Split on the first colon.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.split_once(':')?;
        let side = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        };
        Some(Self {
            start: side(start),
            end: side(end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SelectorItem {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for SelectorItem {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SelectorItem {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SelectorItem {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for SelectorItem {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<IndexLabel> for SelectorItem {
    fn from(value: IndexLabel) -> Self {
        match value {
            IndexLabel::Int64(v) => Self::Int(v),
            IndexLabel::Utf8(v) => Self::Str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selector {
    #[default]
    All,
    Slice(SliceBounds),
    Items(Vec<SelectorItem>),
}

impl Selector {
    /// Build from a list of items. A list holding exactly one string that
    /// contains a colon is a slice.
    #[must_use]
    pub fn from_items(items: Vec<SelectorItem>) -> Self {
        if let [SelectorItem::Str(raw)] = items.as_slice()
            && let Some(bounds) = SliceBounds::parse(raw)
        {
            return Self::Slice(bounds);
        }
        Self::Items(items)
    }

    /// `"start:end"` shorthand.
    #[must_use]
    pub fn slice(raw: &str) -> Self {
        Self::from_items(vec![SelectorItem::from(raw)])
    }

    #[must_use]
    pub fn positions(positions: &[i64]) -> Self {
        Self::Items(positions.iter().copied().map(SelectorItem::Int).collect())
    }

    #[must_use]
    pub fn labels<L: Into<SelectorItem> + Clone>(labels: &[L]) -> Self {
        Self::from_items(labels.iter().cloned().map(Into::into).collect())
    }

    #[must_use]
    pub fn mask(mask: &[bool]) -> Self {
        Self::Items(mask.iter().copied().map(SelectorItem::Bool).collect())
    }

    /// Unwrap the values of a series used as a selector.
    pub fn from_scalars(values: &[Scalar], axis: Axis) -> Result<Self, IndexError> {
        let items = values
            .iter()
            .map(|value| match value {
                Scalar::Bool(v) => Ok(SelectorItem::Bool(*v)),
                Scalar::Int64(v) => Ok(SelectorItem::Int(*v)),
                Scalar::Utf8(v) => Ok(SelectorItem::Str(v.clone())),
                Scalar::Float64(v) if v.is_finite() && *v == v.trunc() => {
                    Ok(SelectorItem::Int(*v as i64))
                }
                other => Err(IndexError::InvalidSelector {
                    axis,
                    reason: format!("cannot select by {other}"),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_items(items))
    }

    /// Decode a JSON selector. `None` and `null` mean "everything"; any other
    /// non-array value is rejected.
    pub fn from_json(value: Option<&Value>, axis: Axis) -> Result<Self, IndexError> {
        let items = match value {
            None | Some(Value::Null) => return Ok(Self::All),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(IndexError::InvalidSelector {
                    axis,
                    reason: format!("expected an array but found {other}"),
                });
            }
        };
        let items = items
            .iter()
            .map(|item| match item {
                Value::Bool(v) => Ok(SelectorItem::Bool(*v)),
                Value::String(v) => Ok(SelectorItem::Str(v.clone())),
                Value::Number(n) => n.as_i64().map(SelectorItem::Int).ok_or_else(|| {
                    IndexError::InvalidSelector {
                        axis,
                        reason: format!("non-integer selector value {n}"),
                    }
                }),
                other => Err(IndexError::InvalidSelector {
                    axis,
                    reason: format!("unsupported selector value {other}"),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_items(items))
    }
}

/// Resolve a selector against `index` into concrete positions.
pub fn resolve_positions(
    index: &Index,
    selector: &Selector,
    mode: IndexMode,
    axis: Axis,
) -> Result<Vec<usize>, IndexError> {
    let positions = match selector {
        Selector::All => (0..index.len()).collect(),
        Selector::Slice(bounds) => match mode {
            IndexMode::Position => position_slice(index.len(), bounds, axis)?,
            IndexMode::Label => label_slice(index, bounds, axis)?,
        },
        Selector::Items(items) => items
            .iter()
            .enumerate()
            .filter_map(|(pos, item)| resolve_item(index, pos, item, mode, axis).transpose())
            .collect::<Result<Vec<_>, _>>()?,
    };
    log::debug!(
        "{mode:?} {axis} selector resolved {} of {} positions",
        positions.len(),
        index.len()
    );
    Ok(positions)
}

fn parse_bound(raw: &str, axis: Axis) -> Result<i64, IndexError> {
    raw.parse::<i64>()
        .map_err(|_| IndexError::InvalidSelector {
            axis,
            reason: format!("slice bound '{raw}' is not an integer"),
        })
}

fn check_position(position: i64, len: usize, axis: Axis) -> Result<usize, IndexError> {
    usize::try_from(position)
        .ok()
        .filter(|&p| p < len)
        .ok_or(IndexError::OutOfRange {
            axis,
            position,
            len,
        })
}

fn position_slice(len: usize, bounds: &SliceBounds, axis: Axis) -> Result<Vec<usize>, IndexError> {
    let start = bounds
        .start
        .as_deref()
        .map_or(Ok(0), |raw| parse_bound(raw, axis))?;
    let end = bounds
        .end
        .as_deref()
        .map_or(Ok(len as i64), |raw| parse_bound(raw, axis))?;
    for bound in [start, end] {
        if bound < 0 || bound > len as i64 {
            return Err(IndexError::OutOfRange {
                axis,
                position: bound,
                len,
            });
        }
    }
    if start >= end {
        return Ok(Vec::new());
    }
    Ok((start as usize..end as usize).collect())
}

fn strip_quotes(raw: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        raw.strip_prefix(quote)
            .and_then(|inner| inner.strip_suffix(quote))
    })
}

/// Find the position of a textual label. Quoted text is only ever a string
/// label; unquoted integer text on the row axis tries the integer label first.
fn lookup_text(index: &Index, raw: &str, axis: Axis) -> Result<usize, IndexError> {
    let found = if let Some(inner) = strip_quotes(raw) {
        index.position(&IndexLabel::from(inner))
    } else if axis == Axis::Rows
        && let Ok(number) = raw.parse::<i64>()
    {
        index
            .position(&IndexLabel::Int64(number))
            .or_else(|| index.position(&IndexLabel::from(raw)))
    } else {
        index.position(&IndexLabel::from(raw))
    };
    found.ok_or_else(|| not_found(raw, axis))
}

fn not_found(raw: &str, axis: Axis) -> IndexError {
    match axis {
        Axis::Rows => IndexError::LabelNotFound {
            label: raw.to_owned(),
        },
        Axis::Columns => IndexError::ColumnNotFound {
            name: raw.to_owned(),
        },
    }
}

fn label_slice(index: &Index, bounds: &SliceBounds, axis: Axis) -> Result<Vec<usize>, IndexError> {
    if index.is_empty() {
        return Ok(Vec::new());
    }
    let start = match bounds.start.as_deref() {
        Some(raw) => lookup_text(index, raw, axis)?,
        None => 0,
    };
    match axis {
        Axis::Rows => {
            let end = match bounds.end.as_deref() {
                Some(raw) => lookup_text(index, raw, axis)?,
                None => index.len() - 1,
            };
            Ok(inclusive(start..=end))
        }
        Axis::Columns => {
            // Column name ranges drop their last resolved position, so an
            // explicit end column is excluded while an open end keeps the
            // final column.
            let end = match bounds.end.as_deref() {
                Some(raw) => lookup_text(index, raw, axis)?,
                None => index.len(),
            };
            let mut positions = inclusive(start..=end);
            positions.pop();
            Ok(positions)
        }
    }
}

fn inclusive(range: RangeInclusive<usize>) -> Vec<usize> {
    range.collect()
}

fn resolve_item(
    index: &Index,
    pos: usize,
    item: &SelectorItem,
    mode: IndexMode,
    axis: Axis,
) -> Result<Option<usize>, IndexError> {
    match item {
        SelectorItem::Bool(_) if axis == Axis::Columns => Err(IndexError::InvalidSelector {
            axis,
            reason: "boolean masks only apply to rows".to_owned(),
        }),
        SelectorItem::Bool(false) => Ok(None),
        SelectorItem::Bool(true) => check_position(pos as i64, index.len(), axis).map(Some),
        SelectorItem::Int(value) => match mode {
            IndexMode::Position => check_position(*value, index.len(), axis).map(Some),
            IndexMode::Label => lookup_text(index, &value.to_string(), axis).map(Some),
        },
        SelectorItem::Str(raw) => match mode {
            IndexMode::Position => Err(IndexError::InvalidSelector {
                axis,
                reason: format!("'{raw}' is not a position"),
            }),
            IndexMode::Label => lookup_text(index, raw, axis).map(Some),
        },
    }
}
