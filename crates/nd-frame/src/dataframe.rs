use std::borrow::Cow;
use std::cmp::Ordering;

use nd_columnar::{Column, ComparisonOp};
use nd_index::{Axis, Index, IndexError, IndexLabel, Selector};
use nd_types::{DType, Scalar, infer_dtype, infer_dtypes, parse_numeric};

use crate::{FrameConfig, FrameError, FrameOptions, NdFrame, RawData, Series};

/// Row-major two-dimensional container.
///
/// `rows`, `index`, `columns` and `dtypes` always agree in length and both
/// axes hold unique labels; every mutation validates before it commits.
#[derive(Debug, Clone)]
pub struct DataFrame {
    rows: Vec<Vec<Scalar>>,
    index: Index,
    columns: Vec<String>,
    dtypes: Vec<DType>,
    config: FrameConfig,
    column_cache: Option<Vec<Vec<Scalar>>>,
}

impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.index == other.index
            && self.columns == other.columns
            && self.dtypes == other.dtypes
            && self.config == other.config
    }
}

pub(crate) fn validate_index(index: &Index, n_rows: usize) -> Result<(), FrameError> {
    if index.len() != n_rows {
        return Err(FrameError::shape("index", n_rows, index.len()));
    }
    index.validate_unique(Axis::Rows)?;
    Ok(())
}

fn validate_columns(columns: &[String], width: usize) -> Result<(), FrameError> {
    if columns.len() != width {
        return Err(FrameError::shape("columns", width, columns.len()));
    }
    Index::from_utf8(columns.to_vec()).validate_unique(Axis::Columns)?;
    Ok(())
}

fn validate_dtypes(dtypes: &[DType], width: usize) -> Result<(), FrameError> {
    if dtypes.len() != width {
        return Err(FrameError::shape("dtypes", width, dtypes.len()));
    }
    Ok(())
}

fn validate_rows(rows: &[Vec<Scalar>], width: usize) -> Result<(), FrameError> {
    match rows.iter().position(|row| row.len() != width) {
        Some(pos) => Err(FrameError::shape(format!("row {pos}"), width, rows[pos].len())),
        None => Ok(()),
    }
}

fn transpose(rows: &[Vec<Scalar>], width: usize) -> Vec<Vec<Scalar>> {
    (0..width)
        .map(|col| rows.iter().map(|row| row[col].clone()).collect())
        .collect()
}

/// Sort key of a present value: booleans, then numbers and numeric text,
/// then other text.
enum SortKey<'a> {
    Bool(bool),
    Number(f64),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    fn of(value: &'a Scalar) -> Self {
        match value {
            Scalar::Bool(v) => Self::Bool(*v),
            Scalar::Int64(v) => Self::Number(*v as f64),
            Scalar::Float64(v) => Self::Number(*v),
            Scalar::Utf8(v) => parse_numeric(v).map_or(Self::Text(v.as_str()), Self::Number),
            Scalar::Null(_) => Self::Number(f64::NAN),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn compare_present(left: &Scalar, right: &Scalar) -> Ordering {
    SortKey::of(left).compare(&SortKey::of(right))
}

/// Missing values sort last regardless of direction.
pub(crate) fn compare_scalars_with_na_last(
    left: &Scalar,
    right: &Scalar,
    ascending: bool,
) -> Ordering {
    match (left.is_missing(), right.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let order = compare_present(left, right);
            if ascending { order } else { order.reverse() }
        }
    }
}

pub(crate) fn label_from_value(value: &Scalar) -> Result<IndexLabel, FrameError> {
    IndexLabel::from_scalar(value).ok_or_else(|| {
        FrameError::Index(IndexError::InvalidSelector {
            axis: Axis::Rows,
            reason: format!("value {value} cannot be a row label"),
        })
    })
}

impl DataFrame {
    /// Build from raw data. Missing `columns` default to `"0".."n-1"` (or the
    /// record keys), a missing index to `0..n`, missing dtypes are inferred.
    pub fn new(data: RawData, options: FrameOptions) -> Result<Self, FrameError> {
        let config = options.config.unwrap_or_default();
        let (rows, columns) = data.into_rows(options.columns)?;
        let index = options
            .index
            .map_or_else(|| Index::range(rows.len()), Index::new);
        let dtypes = options
            .dtypes
            .unwrap_or_else(|| infer_dtypes(&rows, columns.len(), config.dtype_sample_limit));
        Self::from_parts(rows, index, columns, dtypes, config)
    }

    pub fn from_json(value: &serde_json::Value, options: FrameOptions) -> Result<Self, FrameError> {
        Self::new(RawData::from_json(value)?, options)
    }

    pub fn from_parts(
        rows: Vec<Vec<Scalar>>,
        index: Index,
        columns: Vec<String>,
        dtypes: Vec<DType>,
        config: FrameConfig,
    ) -> Result<Self, FrameError> {
        let width = columns.len();
        validate_rows(&rows, width)?;
        validate_columns(&columns, width)?;
        validate_dtypes(&dtypes, width)?;
        validate_index(&index, rows.len())?;

        let mut frame = Self {
            rows,
            index,
            columns,
            dtypes,
            config,
            column_cache: None,
        };
        frame.refresh_cache();
        Ok(frame)
    }

    /// Assemble from named columns of equal length.
    pub fn from_columns(
        index: Index,
        columns: Vec<(String, Column)>,
        config: FrameConfig,
    ) -> Result<Self, FrameError> {
        let n_rows = index.len();
        let mut names = Vec::with_capacity(columns.len());
        let mut dtypes = Vec::with_capacity(columns.len());
        let mut column_values = Vec::with_capacity(columns.len());
        for (name, column) in columns {
            if column.len() != n_rows {
                return Err(FrameError::shape(format!("column '{name}'"), n_rows, column.len()));
            }
            dtypes.push(column.dtype());
            column_values.push(column.into_values());
            names.push(name);
        }
        let rows = (0..n_rows)
            .map(|row| column_values.iter().map(|values| values[row].clone()).collect())
            .collect();
        Self::from_parts(rows, index, names, dtypes, config)
    }

    fn refresh_cache(&mut self) {
        self.column_cache = if self.config.low_memory_mode {
            None
        } else {
            Some(transpose(&self.rows, self.columns.len()))
        };
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn dtypes(&self) -> &[DType] {
        &self.dtypes
    }

    #[must_use]
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    #[must_use]
    pub fn values(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    #[must_use]
    pub fn to_values(&self) -> Vec<Vec<Scalar>> {
        self.rows.clone()
    }

    /// The row stored under `label`.
    #[must_use]
    pub fn get_row(&self, label: &IndexLabel) -> Option<&[Scalar]> {
        self.index.position(label).map(|pos| self.rows[pos].as_slice())
    }

    pub fn column_position(&self, name: &str) -> Result<usize, FrameError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| {
                FrameError::Index(IndexError::ColumnNotFound {
                    name: name.to_owned(),
                })
            })
    }

    pub(crate) fn values_at(&self, col: usize) -> Cow<'_, [Scalar]> {
        match &self.column_cache {
            Some(cache) => Cow::Borrowed(cache[col].as_slice()),
            None => Cow::Owned(self.rows.iter().map(|row| row[col].clone()).collect()),
        }
    }

    /// Values of one column, from the cache or by scanning rows.
    pub fn column_values(&self, name: &str) -> Result<Cow<'_, [Scalar]>, FrameError> {
        let col = self.column_position(name)?;
        Ok(self.values_at(col))
    }

    pub fn column(&self, name: &str) -> Result<Column, FrameError> {
        let col = self.column_position(name)?;
        Ok(Column::new(
            self.dtypes[col],
            self.values_at(col).into_owned(),
        ))
    }

    pub fn get_column(&self, name: &str) -> Result<Series, FrameError> {
        let col = self.column_position(name)?;
        Series::from_parts(
            name,
            self.values_at(col).into_owned(),
            self.index.clone(),
            self.dtypes[col],
            self.config,
        )
    }

    pub(crate) fn column_pairs(&self) -> Vec<(String, Column)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                (
                    name.clone(),
                    Column::new(self.dtypes[col], self.values_at(col).into_owned()),
                )
            })
            .collect()
    }

    /// Gather rows and columns by position.
    ///
    /// Selecting the same row or column twice would break label uniqueness
    /// and is rejected.
    pub(crate) fn gather(&self, rows: &[usize], columns: &[usize]) -> Result<Self, FrameError> {
        let index = self.index.take(rows);
        let names: Vec<String> = columns.iter().map(|&c| self.columns[c].clone()).collect();
        let column_index = Index::from_utf8(names.clone());
        for (labels, axis) in [(&index, Axis::Rows), (&column_index, Axis::Columns)] {
            if let Err(err) = labels.validate_unique(axis) {
                log::warn!("rejecting selection: {err}");
                return Err(err.into());
            }
        }

        let data = rows
            .iter()
            .map(|&r| columns.iter().map(|&c| self.rows[r][c].clone()).collect())
            .collect();
        let dtypes = columns.iter().map(|&c| self.dtypes[c]).collect();
        Self::from_parts(data, index, names, dtypes, self.config)
    }

    pub(crate) fn take_rows(&self, rows: &[usize]) -> Result<Self, FrameError> {
        let all: Vec<usize> = (0..self.columns.len()).collect();
        self.gather(rows, &all)
    }

    // ── Mutators ──────────────────────────────────────────────────────────

    pub fn set_index(&mut self, labels: Vec<IndexLabel>) -> Result<(), FrameError> {
        let index = Index::new(labels);
        validate_index(&index, self.len())?;
        self.index = index;
        Ok(())
    }

    pub fn with_index(&self, labels: Vec<IndexLabel>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_index(labels)?;
        Ok(out)
    }

    pub fn set_column_names(&mut self, names: Vec<String>) -> Result<(), FrameError> {
        validate_columns(&names, self.columns.len())?;
        self.columns = names;
        Ok(())
    }

    pub fn with_column_names(&self, names: Vec<String>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_column_names(names)?;
        Ok(out)
    }

    pub fn set_dtypes(&mut self, dtypes: Vec<DType>) -> Result<(), FrameError> {
        validate_dtypes(&dtypes, self.columns.len())?;
        self.dtypes = dtypes;
        Ok(())
    }

    pub fn with_dtypes(&self, dtypes: Vec<DType>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_dtypes(dtypes)?;
        Ok(out)
    }

    /// Replace every row. The row count must match the index; dtypes are
    /// inferred again.
    pub fn set_values(&mut self, rows: Vec<Vec<Scalar>>) -> Result<(), FrameError> {
        validate_rows(&rows, self.columns.len())?;
        if rows.len() != self.index.len() {
            return Err(FrameError::shape("values", self.index.len(), rows.len()));
        }
        self.dtypes = infer_dtypes(&rows, self.columns.len(), self.config.dtype_sample_limit);
        self.rows = rows;
        self.refresh_cache();
        Ok(())
    }

    pub fn with_values(&self, rows: Vec<Vec<Scalar>>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_values(rows)?;
        Ok(out)
    }

    /// Add a column, or replace the values of an existing one.
    pub fn set_column(&mut self, name: &str, values: Vec<Scalar>) -> Result<(), FrameError> {
        if values.len() != self.len() {
            return Err(FrameError::shape(
                format!("column '{name}'"),
                self.len(),
                values.len(),
            ));
        }
        let dtype = infer_dtype(&values, self.config.dtype_sample_limit);
        match self.columns.iter().position(|column| column == name) {
            Some(col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[col] = value;
                }
                self.dtypes[col] = dtype;
            }
            None => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
                self.columns.push(name.to_owned());
                self.dtypes.push(dtype);
            }
        }
        self.refresh_cache();
        Ok(())
    }

    pub fn with_column(&self, name: &str, values: Vec<Scalar>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_column(name, values)?;
        Ok(out)
    }

    pub fn rename_columns_in_place(&mut self, mapping: &[(&str, &str)]) -> Result<(), FrameError> {
        let mut names = self.columns.clone();
        for (from, to) in mapping {
            let col = self.column_position(from)?;
            names[col] = (*to).to_owned();
        }
        self.set_column_names(names)
    }

    pub fn rename_columns(&self, mapping: &[(&str, &str)]) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.rename_columns_in_place(mapping)?;
        Ok(out)
    }

    pub fn astype_in_place(&mut self, column: &str, dtype: DType) -> Result<(), FrameError> {
        let col = self.column_position(column)?;
        let cast = Column::new(self.dtypes[col], self.values_at(col).into_owned()).cast(dtype)?;
        for (row, value) in self.rows.iter_mut().zip(cast.into_values()) {
            row[col] = value;
        }
        self.dtypes[col] = dtype;
        self.refresh_cache();
        Ok(())
    }

    pub fn astype(&self, column: &str, dtype: DType) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.astype_in_place(column, dtype)?;
        Ok(out)
    }

    pub fn reset_index_in_place(&mut self) {
        self.index = Index::range(self.len());
    }

    #[must_use]
    pub fn reset_index(&self) -> Self {
        let mut out = self.clone();
        out.reset_index_in_place();
        out
    }

    /// Use a column's values as the index, optionally removing the column.
    pub fn set_index_from_column_in_place(
        &mut self,
        column: &str,
        drop: bool,
    ) -> Result<(), FrameError> {
        let labels = self
            .column_values(column)?
            .iter()
            .map(label_from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let index = Index::new(labels);
        validate_index(&index, self.len())?;
        self.index = index;
        if drop {
            self.drop_columns_in_place(&[column])?;
        }
        Ok(())
    }

    pub fn set_index_from_column(&self, column: &str, drop: bool) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_index_from_column_in_place(column, drop)?;
        Ok(out)
    }

    pub fn drop_columns_in_place(&mut self, names: &[&str]) -> Result<(), FrameError> {
        let mut doomed = names
            .iter()
            .map(|name| self.column_position(name))
            .collect::<Result<Vec<_>, _>>()?;
        doomed.sort_unstable();
        doomed.dedup();
        for &col in doomed.iter().rev() {
            for row in &mut self.rows {
                row.remove(col);
            }
            self.columns.remove(col);
            self.dtypes.remove(col);
        }
        self.refresh_cache();
        Ok(())
    }

    pub fn drop_columns(&self, names: &[&str]) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.drop_columns_in_place(names)?;
        Ok(out)
    }

    pub fn drop_rows_in_place(&mut self, labels: &[IndexLabel]) -> Result<(), FrameError> {
        let mut doomed = Vec::with_capacity(labels.len());
        for label in labels {
            let pos = self.index.position(label).ok_or_else(|| IndexError::LabelNotFound {
                label: label.to_string(),
            })?;
            doomed.push(pos);
        }
        let keep: Vec<usize> = (0..self.len()).filter(|pos| !doomed.contains(pos)).collect();
        *self = self.take_rows(&keep)?;
        Ok(())
    }

    pub fn drop_rows(&self, labels: &[IndexLabel]) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.drop_rows_in_place(labels)?;
        Ok(out)
    }

    /// Stable sort on one column; missing values go last.
    pub fn sort_values_in_place(&mut self, column: &str, ascending: bool) -> Result<(), FrameError> {
        let values = self.column_values(column)?.into_owned();
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| compare_scalars_with_na_last(&values[a], &values[b], ascending));
        *self = self.take_rows(&order)?;
        Ok(())
    }

    pub fn sort_values(&self, column: &str, ascending: bool) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.sort_values_in_place(column, ascending)?;
        Ok(out)
    }

    pub fn sort_index_in_place(&mut self, ascending: bool) -> Result<(), FrameError> {
        let mut order = self.index.argsort();
        if !ascending {
            order.reverse();
        }
        *self = self.take_rows(&order)?;
        Ok(())
    }

    pub fn sort_index(&self, ascending: bool) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.sort_index_in_place(ascending)?;
        Ok(out)
    }

    /// Keep the rows where `mask` is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self, FrameError> {
        if mask.len() != self.len() {
            return Err(FrameError::shape("mask", self.len(), mask.len()));
        }
        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(pos, &keep)| keep.then_some(pos))
            .collect();
        self.take_rows(&keep)
    }

    pub fn filter_rows_in_place(&mut self, mask: &[bool]) -> Result<(), FrameError> {
        *self = self.filter_rows(mask)?;
        Ok(())
    }

    /// Rows where `column <op> value` holds.
    pub fn query(&self, column: &str, op: ComparisonOp, value: &Scalar) -> Result<Self, FrameError> {
        let mask = self.column(column)?.compare_scalar(value, op)?.truthy_mask();
        self.filter_rows(&mask)
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Result<Self, FrameError> {
        let end = n.min(self.len());
        self.iloc(&Selector::slice(&format!(":{end}")), &Selector::All)
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Result<Self, FrameError> {
        let start = self.len() - n.min(self.len());
        self.iloc(&Selector::slice(&format!("{start}:")), &Selector::All)
    }
}

impl NdFrame for DataFrame {
    fn ndim(&self) -> usize {
        2
    }

    fn shape(&self) -> (usize, usize) {
        DataFrame::shape(self)
    }

    fn index(&self) -> &Index {
        &self.index
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn dtypes(&self) -> &[DType] {
        &self.dtypes
    }

    fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn to_rows(&self) -> Vec<Vec<Scalar>> {
        self.rows.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use nd_columnar::{Column, ComparisonOp};
    use nd_index::{Index, IndexLabel};
    use nd_types::{DType, ErrorKind, NullKind, Scalar};
    use serde_json::json;

    use super::{DataFrame, compare_present};
    use crate::{FrameConfig, FrameOptions};

    fn sales() -> DataFrame {
        DataFrame::from_json(
            &json!({
                "region": ["north", "south", "east", "west"],
                "units": [10, null, 7, 3],
                "price": [2.5, 1.0, 4.0, 3.5]
            }),
            FrameOptions::default(),
        )
        .expect("frame should build")
    }

    #[test]
    fn construction_infers_dtypes_and_defaults() {
        let frame = sales();
        assert_eq!(frame.shape(), (4, 3));
        assert_eq!(
            frame.dtypes(),
            &[DType::Utf8, DType::Float64, DType::Float64]
        );
        assert_eq!(frame.index().labels()[3], IndexLabel::Int64(3));
    }

    #[test]
    fn construction_rejects_bad_metadata() {
        let rows = json!([[1, 2], [3, 4]]);
        let err = DataFrame::from_json(&rows, FrameOptions::default().index([0_i64]))
            .expect_err("short index");
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = DataFrame::from_json(&rows, FrameOptions::default().index([1_i64, 1]))
            .expect_err("duplicate index");
        assert_eq!(err.kind(), ErrorKind::DuplicateLabel);

        let err = DataFrame::from_json(&rows, FrameOptions::default().columns(["a", "a"]))
            .expect_err("duplicate columns");
        assert_eq!(err.kind(), ErrorKind::DuplicateLabel);

        let err = DataFrame::from_json(&rows, FrameOptions::default().columns(["a"]))
            .expect_err("column count");
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = DataFrame::from_json(&rows, FrameOptions::default().dtypes(vec![DType::Int64]))
            .expect_err("dtype count");
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn failed_mutation_leaves_frame_untouched() {
        let mut frame = sales();
        let before = frame.clone();
        let err = frame
            .set_index(vec![IndexLabel::from("a"), IndexLabel::from("a")])
            .expect_err("duplicates");
        assert_eq!(err.kind(), ErrorKind::DuplicateLabel);
        let err = frame
            .set_column_names(vec!["x".to_owned()])
            .expect_err("too few names");
        assert_eq!(err.kind(), ErrorKind::Shape);
        let err = frame
            .set_values(vec![vec![Scalar::Int64(1)]])
            .expect_err("wrong width");
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert_eq!(frame, before);
    }

    #[test]
    fn pure_and_in_place_forms_agree() {
        let frame = sales();
        let renamed = frame
            .with_column_names(vec!["r".into(), "u".into(), "p".into()])
            .expect("valid names");
        let mut in_place = frame.clone();
        in_place
            .set_column_names(vec!["r".into(), "u".into(), "p".into()])
            .expect("valid names");
        assert_eq!(renamed, in_place);
        assert_eq!(frame.columns()[0], "region");
    }

    #[test]
    fn set_column_adds_and_replaces() {
        let mut frame = sales();
        frame
            .set_column("flag", vec![true.into(), false.into(), true.into(), true.into()])
            .expect("new column");
        assert_eq!(frame.columns().len(), 4);
        assert_eq!(frame.dtypes()[3], DType::Bool);

        frame
            .set_column("units", vec![1.into(), 2.into(), 3.into(), 4.into()])
            .expect("replace");
        assert_eq!(frame.dtypes()[1], DType::Int64);
        assert_eq!(
            frame.column_values("units").expect("present").as_ref(),
            &[Scalar::Int64(1), Scalar::Int64(2), Scalar::Int64(3), Scalar::Int64(4)]
        );

        let err = frame
            .set_column("short", vec![1.into()])
            .expect_err("length");
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn low_memory_mode_reads_the_same_values() {
        let config = FrameConfig::default().with_low_memory_mode(true);
        let frame = DataFrame::from_json(
            &json!([[1, "a"], [2, "b"]]),
            FrameOptions::default().config(config),
        )
        .expect("frame");
        assert_eq!(
            frame.column_values("1").expect("column").as_ref(),
            &[Scalar::from("a"), Scalar::from("b")]
        );
        let err = frame.column_values("9").expect_err("no such column");
        assert_eq!(err.kind(), ErrorKind::ColumnIndex);
    }

    #[test]
    fn get_column_builds_a_series() {
        let series = sales().get_column("price").expect("column");
        assert_eq!(series.name(), "price");
        assert_eq!(series.dtype(), DType::Float64);
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn rename_and_astype() {
        let frame = sales()
            .rename_columns(&[("units", "qty")])
            .expect("rename");
        assert_eq!(frame.columns()[1], "qty");
        let err = frame
            .rename_columns(&[("qty", "price")])
            .expect_err("collides");
        assert_eq!(err.kind(), ErrorKind::DuplicateLabel);

        let cast = frame.astype("price", DType::Int64).expect("cast");
        assert_eq!(cast.dtypes()[2], DType::Int64);
        assert_eq!(cast.values()[0][2], Scalar::Int64(2));
    }

    #[test]
    fn index_from_column_and_reset() {
        let frame = sales()
            .set_index_from_column("region", true)
            .expect("string labels");
        assert_eq!(frame.columns(), &["units".to_owned(), "price".to_owned()]);
        assert_eq!(frame.index().labels()[1], IndexLabel::from("south"));

        let reset = frame.reset_index();
        assert_eq!(reset.index().labels()[1], IndexLabel::Int64(1));

        let err = sales()
            .set_index_from_column("units", false)
            .expect_err("missing value cannot label a row");
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn drop_rows_and_columns() {
        let frame = sales()
            .drop_columns(&["price"])
            .expect("drop column")
            .drop_rows(&[IndexLabel::Int64(0), IndexLabel::Int64(2)])
            .expect("drop rows");
        assert_eq!(frame.shape(), (2, 2));
        assert_eq!(frame.index().labels(), &[IndexLabel::Int64(1), IndexLabel::Int64(3)]);

        let err = frame
            .drop_rows(&[IndexLabel::Int64(0)])
            .expect_err("already gone");
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    #[test]
    fn sort_values_puts_missing_last_in_both_directions() {
        let frame = sales();
        let ascending = frame.sort_values("units", true).expect("sort");
        assert_eq!(
            ascending.index().labels(),
            &[
                IndexLabel::Int64(3),
                IndexLabel::Int64(2),
                IndexLabel::Int64(0),
                IndexLabel::Int64(1)
            ]
        );
        let descending = frame.sort_values("units", false).expect("sort");
        assert_eq!(
            descending.values()[3][1],
            Scalar::Null(NullKind::Null)
        );
        let restored = descending.sort_index(true).expect("sort index");
        assert_eq!(restored, frame);
    }

    #[test]
    fn sort_values_orders_mixed_text_and_numbers() {
        let values: Vec<Scalar> = (0..200)
            .map(|i| match i % 3 {
                0 => Scalar::Utf8(format!("{}", i % 10)),
                1 => Scalar::Int64(i % 10 + 1),
                _ => Scalar::Utf8(format!("{}x", i % 50)),
            })
            .collect();
        let frame = DataFrame::from_columns(
            Index::range(values.len()),
            vec![("v".to_owned(), Column::new(DType::Utf8, values))],
            FrameConfig::default(),
        )
        .expect("frame");
        let sorted = frame.sort_values("v", true).expect("sort");
        let column = sorted.column_values("v").expect("v");
        for pair in column.windows(2) {
            assert_ne!(
                compare_present(&pair[0], &pair[1]),
                Ordering::Greater,
                "{:?} sorted before {:?}",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(column[0], Scalar::from("0"));
        assert_eq!(column[199], Scalar::from("9x"));
    }

    #[test]
    fn filter_query_head_tail() {
        let frame = sales();
        let cheap = frame
            .query("price", ComparisonOp::Lt, &Scalar::Float64(3.0))
            .expect("query");
        assert_eq!(cheap.len(), 2);

        let err = frame.filter_rows(&[true]).expect_err("mask length");
        assert_eq!(err.kind(), ErrorKind::Shape);

        assert_eq!(frame.head(2).expect("head").len(), 2);
        assert_eq!(frame.head(10).expect("head").len(), 4);
        let tail = frame.tail(1).expect("tail");
        assert_eq!(tail.index().labels(), &[IndexLabel::Int64(3)]);
    }
}
