//! Raw construction input and the options that accompany it.

use std::str::FromStr;

use nd_index::IndexLabel;
use nd_types::{DType, NullKind, Scalar};
use serde_json::{Map, Value};

use crate::{FrameConfig, FrameError};

/// The input shapes a container can be built from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    /// A flat sequence; builds a series.
    Scalars(Vec<Scalar>),
    /// Row-major array of arrays.
    Rows(Vec<Vec<Scalar>>),
    /// Array of plain records; key order of each record is preserved.
    Records(Vec<Vec<(String, Scalar)>>),
    /// Record of parallel arrays.
    ColumnMap(Vec<(String, Vec<Scalar>)>),
}

fn scalar_from_json(value: &Value) -> Option<Scalar> {
    match value {
        Value::Null => Some(Scalar::Null(NullKind::Null)),
        Value::Bool(v) => Some(Scalar::Bool(*v)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(v) => Scalar::Int64(v),
            None => Scalar::Float64(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Value::String(v) => Some(Scalar::Utf8(v.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn scalars_from_json(values: &[Value], context: &str) -> Result<Vec<Scalar>, FrameError> {
    values
        .iter()
        .map(|value| {
            scalar_from_json(value)
                .ok_or_else(|| FrameError::Format(format!("{context} holds a nested value")))
        })
        .collect()
}

fn record_from_json(record: &Map<String, Value>) -> Result<Vec<(String, Scalar)>, FrameError> {
    record
        .iter()
        .map(|(key, value)| {
            scalar_from_json(value)
                .map(|scalar| (key.clone(), scalar))
                .ok_or_else(|| FrameError::Format(format!("record field '{key}' is nested")))
        })
        .collect()
}

impl RawData {
    /// Classify a JSON document into one of the accepted shapes.
    pub fn from_json(value: &Value) -> Result<Self, FrameError> {
        match value {
            Value::Array(items) if items.iter().all(Value::is_array) && !items.is_empty() => items
                .iter()
                .filter_map(Value::as_array)
                .map(|row| scalars_from_json(row, "row"))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Rows),
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(record_from_json)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::Records)
            }
            Value::Array(items) => scalars_from_json(items, "flat array").map(Self::Scalars),
            Value::Object(map) => map
                .iter()
                .map(|(key, column)| match column {
                    Value::Array(values) => Ok((key.clone(), scalars_from_json(values, key)?)),
                    other => Err(FrameError::Format(format!(
                        "column '{key}' must be an array, found {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::ColumnMap),
            other => Err(FrameError::Format(format!(
                "expected an array or object, found {other}"
            ))),
        }
    }

    /// Expand into row-major form, returning the rows and their column names.
    ///
    /// `columns` names the columns explicitly. For keyed shapes it selects and
    /// orders the keys; for positional shapes it only names them.
    pub(crate) fn into_rows(
        self,
        columns: Option<Vec<String>>,
    ) -> Result<(Vec<Vec<Scalar>>, Vec<String>), FrameError> {
        match self {
            Self::Scalars(values) => {
                let names = columns.unwrap_or_else(|| vec!["0".to_owned()]);
                Ok((values.into_iter().map(|v| vec![v]).collect(), names))
            }
            Self::Rows(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                for (pos, row) in rows.iter().enumerate() {
                    if row.len() != width {
                        return Err(FrameError::shape(format!("row {pos}"), width, row.len()));
                    }
                }
                let names = columns.unwrap_or_else(|| (0..width).map(|c| c.to_string()).collect());
                Ok((rows, names))
            }
            Self::Records(records) => {
                let names = columns.unwrap_or_else(|| {
                    records
                        .first()
                        .map(|first| first.iter().map(|(key, _)| key.clone()).collect())
                        .unwrap_or_default()
                });
                let rows = records
                    .into_iter()
                    .map(|record| {
                        names
                            .iter()
                            .map(|name| {
                                record
                                    .iter()
                                    .find(|(key, _)| key == name)
                                    .map_or(Scalar::Null(NullKind::Undefined), |(_, v)| v.clone())
                            })
                            .collect()
                    })
                    .collect();
                Ok((rows, names))
            }
            Self::ColumnMap(map) => {
                let height = map.first().map_or(0, |(_, values)| values.len());
                for (name, values) in &map {
                    if values.len() != height {
                        return Err(FrameError::shape(
                            format!("column '{name}'"),
                            height,
                            values.len(),
                        ));
                    }
                }
                let names =
                    columns.unwrap_or_else(|| map.iter().map(|(name, _)| name.clone()).collect());
                let sources: Vec<Option<&Vec<Scalar>>> = names
                    .iter()
                    .map(|name| map.iter().find(|(key, _)| key == name).map(|(_, v)| v))
                    .collect();
                let rows = (0..height)
                    .map(|row| {
                        sources
                            .iter()
                            .map(|source| match source {
                                Some(values) => values[row].clone(),
                                None => Scalar::Null(NullKind::Undefined),
                            })
                            .collect()
                    })
                    .collect();
                Ok((rows, names))
            }
        }
    }
}

impl From<Vec<Scalar>> for RawData {
    fn from(value: Vec<Scalar>) -> Self {
        Self::Scalars(value)
    }
}

impl From<Vec<Vec<Scalar>>> for RawData {
    fn from(value: Vec<Vec<Scalar>>) -> Self {
        Self::Rows(value)
    }
}

/// Optional metadata supplied alongside raw data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOptions {
    pub index: Option<Vec<IndexLabel>>,
    pub columns: Option<Vec<String>>,
    pub dtypes: Option<Vec<DType>>,
    pub config: Option<FrameConfig>,
}

impl FrameOptions {
    #[must_use]
    pub fn index<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<IndexLabel>,
    {
        self.index = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn dtypes(mut self, dtypes: Vec<DType>) -> Self {
        self.dtypes = Some(dtypes);
        self
    }

    /// Dtypes given as tags such as `"float"` or `"string"`.
    pub fn dtype_tags(mut self, tags: &[&str]) -> Result<Self, FrameError> {
        let dtypes = tags
            .iter()
            .map(|tag| DType::from_str(tag))
            .collect::<Result<Vec<_>, _>>()?;
        self.dtypes = Some(dtypes);
        Ok(self)
    }

    #[must_use]
    pub fn config(mut self, config: FrameConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[cfg(test)]
mod tests {
    use nd_types::{ErrorKind, NullKind, Scalar};
    use serde_json::json;

    use super::{FrameOptions, RawData};

    #[test]
    fn json_shapes_classify() {
        assert!(matches!(
            RawData::from_json(&json!([1, "a", null])).expect("flat"),
            RawData::Scalars(_)
        ));
        assert!(matches!(
            RawData::from_json(&json!([[1], [2]])).expect("rows"),
            RawData::Rows(_)
        ));
        assert!(matches!(
            RawData::from_json(&json!([{"a": 1}])).expect("records"),
            RawData::Records(_)
        ));
        assert!(matches!(
            RawData::from_json(&json!({"a": [1, 2]})).expect("column map"),
            RawData::ColumnMap(_)
        ));
    }

    #[test]
    fn unsupported_shapes_are_format_errors() {
        for bad in [
            json!("text"),
            json!([[1, [2]]]),
            json!([1, [2]]),
            json!({"a": 1}),
        ] {
            let err = RawData::from_json(&bad).expect_err("unsupported");
            assert_eq!(err.kind(), ErrorKind::Format, "{bad}");
        }
    }

    #[test]
    fn json_numbers_keep_integers() {
        let RawData::Scalars(values) = RawData::from_json(&json!([1, 1.5, null])).expect("flat")
        else {
            panic!("expected scalars");
        };
        assert_eq!(
            values,
            vec![
                Scalar::Int64(1),
                Scalar::Float64(1.5),
                Scalar::Null(NullKind::Null)
            ]
        );
    }

    #[test]
    fn records_take_columns_from_first_record() {
        let raw = RawData::from_json(&json!([{"a": 1, "b": 2}, {"b": 3}])).expect("records");
        let (rows, names) = raw.into_rows(None).expect("expand");
        assert_eq!(names, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(rows[1], vec![Scalar::Null(NullKind::Undefined), Scalar::Int64(3)]);
    }

    #[test]
    fn explicit_columns_project_records() {
        let raw = RawData::from_json(&json!([{"a": 1, "b": 2}])).expect("records");
        let (rows, names) = raw
            .into_rows(Some(vec!["b".to_owned()]))
            .expect("projection");
        assert_eq!(names, vec!["b".to_owned()]);
        assert_eq!(rows, vec![vec![Scalar::Int64(2)]]);
    }

    #[test]
    fn ragged_input_is_a_shape_error() {
        let err = RawData::from_json(&json!([[1, 2], [3]]))
            .expect("rows")
            .into_rows(None)
            .expect_err("ragged");
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = RawData::from_json(&json!({"a": [1, 2], "b": [1]}))
            .expect("column map")
            .into_rows(None)
            .expect_err("uneven columns");
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn unknown_dtype_tags_are_rejected() {
        let err = FrameOptions::default()
            .dtype_tags(&["int", "decimal"])
            .expect_err("decimal is unknown");
        assert_eq!(err.kind(), ErrorKind::DtypeNotSupported);
    }
}
