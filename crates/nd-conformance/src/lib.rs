#![forbid(unsafe_code)]

//! JSON fixture harness: each case builds a container from raw data, runs one
//! operation and compares the outcome against an expected frame or error kind.

use std::fs;
use std::path::{Path, PathBuf};

use nd_frame::{Axis, DataFrame, FrameError, FrameOptions, IndexLabel, Selector, Table};
use nd_groupby::{GroupByError, GroupByExt};
use nd_types::{ErrorKind, Scalar};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureOperation {
    Construct,
    Iloc,
    Loc,
    Groupby,
}

/// Construction metadata as written in fixture files. Index labels are plain
/// JSON integers or strings; dtypes are tags such as `"int"` or `"string"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureOptions {
    pub index: Option<Vec<Value>>,
    pub columns: Option<Vec<String>>,
    pub dtypes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureFrame {
    pub index: Vec<Value>,
    pub columns: Vec<String>,
    pub dtypes: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureExpected {
    Frame(FixtureFrame),
    Error(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureCase {
    pub case_id: String,
    pub operation: FixtureOperation,
    pub data: Value,
    #[serde(default)]
    pub options: FixtureOptions,
    /// Row selector for `iloc`/`loc`; absent means all rows.
    #[serde(default)]
    pub rows: Option<Value>,
    /// Column selector for `iloc`/`loc`; absent means all columns.
    #[serde(default)]
    pub columns: Option<Value>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub targets: Option<Vec<String>>,
    #[serde(default)]
    pub agg: Option<String>,
    pub expected: FixtureExpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_id: String,
    pub operation: FixtureOperation,
    pub status: CaseStatus,
    pub mismatch: Option<String>,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
enum CaseError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    GroupBy(#[from] GroupByError),
    #[error("malformed fixture: {0}")]
    Fixture(String),
}

impl CaseError {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Frame(err) => Some(err.kind()),
            Self::GroupBy(err) => Some(err.kind()),
            Self::Fixture(_) => None,
        }
    }
}

#[must_use]
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

pub fn load_fixtures(path: &Path) -> Result<Vec<FixtureCase>, HarnessError> {
    let body = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

/// Run every case in one fixture file.
pub fn run_fixture_file(path: &Path) -> Result<Vec<CaseResult>, HarnessError> {
    Ok(load_fixtures(path)?.iter().map(run_fixture).collect())
}

#[must_use]
pub fn run_fixture(case: &FixtureCase) -> CaseResult {
    let mismatch = compare(execute(case), &case.expected);
    let status = if mismatch.is_none() {
        CaseStatus::Pass
    } else {
        CaseStatus::Fail
    };
    match &mismatch {
        Some(reason) => log::warn!("case {} failed: {reason}", case.case_id),
        None => log::debug!("case {} passed", case.case_id),
    }
    CaseResult {
        case_id: case.case_id.clone(),
        operation: case.operation,
        status,
        mismatch,
    }
}

fn labels_from_json(values: &[Value]) -> Result<Vec<IndexLabel>, CaseError> {
    values
        .iter()
        .map(|value| match value {
            Value::String(v) => Ok(IndexLabel::Utf8(v.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(IndexLabel::Int64)
                .ok_or_else(|| CaseError::Fixture(format!("index label {n} is not an integer"))),
            other => Err(CaseError::Fixture(format!("unsupported index label {other}"))),
        })
        .collect()
}

fn frame_options(options: &FixtureOptions) -> Result<FrameOptions, CaseError> {
    let mut out = FrameOptions::default();
    if let Some(index) = &options.index {
        out.index = Some(labels_from_json(index)?);
    }
    out.columns.clone_from(&options.columns);
    if let Some(tags) = &options.dtypes {
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        out = out.dtype_tags(&tags)?;
    }
    Ok(out)
}

fn expected_frame(frame: &FixtureFrame) -> Result<DataFrame, CaseError> {
    let options = frame_options(&FixtureOptions {
        index: Some(frame.index.clone()),
        columns: Some(frame.columns.clone()),
        dtypes: Some(frame.dtypes.clone()),
    })?;
    let rows = Value::Array(frame.values.iter().cloned().map(Value::Array).collect());
    Ok(DataFrame::from_json(&rows, options)?)
}

fn execute(case: &FixtureCase) -> Result<DataFrame, CaseError> {
    let table = Table::from_json(&case.data, frame_options(&case.options)?)?;
    match case.operation {
        FixtureOperation::Construct => Ok(table.into_frame()?),
        FixtureOperation::Iloc | FixtureOperation::Loc => {
            let rows = Selector::from_json(case.rows.as_ref(), Axis::Rows).map_err(FrameError::from)?;
            let columns =
                Selector::from_json(case.columns.as_ref(), Axis::Columns).map_err(FrameError::from)?;
            let selected = if case.operation == FixtureOperation::Iloc {
                table.iloc(&rows, &columns)?
            } else {
                table.loc(&rows, &columns)?
            };
            Ok(selected.into_frame()?)
        }
        FixtureOperation::Groupby => {
            let frame = table.into_frame()?;
            let keys: Vec<&str> = case.keys.iter().map(String::as_str).collect();
            let mut grouped = frame.groupby(&keys)?;
            if let Some(targets) = &case.targets {
                let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                grouped = grouped.col(&targets)?;
            }
            let op = case
                .agg
                .as_deref()
                .ok_or_else(|| CaseError::Fixture("groupby case without 'agg'".to_owned()))?;
            Ok(grouped.aggregate_by_name(op)?)
        }
    }
}

fn compare(actual: Result<DataFrame, CaseError>, expected: &FixtureExpected) -> Option<String> {
    match (actual, expected) {
        (Ok(frame), FixtureExpected::Frame(want)) => match expected_frame(want) {
            Ok(want) => frame_mismatch(&frame, &want),
            Err(err) => Some(format!("expected frame does not build: {err}")),
        },
        (Err(err), FixtureExpected::Error(kind)) => {
            if err.kind() == Some(*kind) {
                None
            } else {
                Some(format!("expected a {kind:?} error, got: {err}"))
            }
        }
        (Ok(frame), FixtureExpected::Error(kind)) => Some(format!(
            "expected a {kind:?} error, got a {}x{} frame",
            frame.len(),
            frame.columns().len()
        )),
        (Err(err), FixtureExpected::Frame(_)) => Some(format!("unexpected error: {err}")),
    }
}

fn cells_match(left: &Scalar, right: &Scalar) -> bool {
    left.semantic_eq(right) || (left.is_missing() && right.is_missing())
}

/// First difference between two frames; missing values of any kind compare
/// equal.
#[must_use]
pub fn frame_mismatch(actual: &DataFrame, expected: &DataFrame) -> Option<String> {
    if actual.index() != expected.index() {
        return Some(format!(
            "index {:?} != {:?}",
            actual.index().labels(),
            expected.index().labels()
        ));
    }
    if actual.columns() != expected.columns() {
        return Some(format!("columns {:?} != {:?}", actual.columns(), expected.columns()));
    }
    if actual.dtypes() != expected.dtypes() {
        return Some(format!("dtypes {:?} != {:?}", actual.dtypes(), expected.dtypes()));
    }
    for (row, (left, right)) in actual.values().iter().zip(expected.values()).enumerate() {
        for (col, (l, r)) in left.iter().zip(right).enumerate() {
            if !cells_match(l, r) {
                return Some(format!("cell ({row}, {col}): {l:?} != {r:?}"));
            }
        }
    }
    None
}
