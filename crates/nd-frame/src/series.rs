use nd_columnar::Column;
use nd_index::{Axis, Index, IndexLabel, Selector};
use nd_types::{DType, Scalar, infer_dtype};

use crate::dataframe::{compare_scalars_with_na_last, validate_index};
use crate::{DataFrame, FrameConfig, FrameError, FrameOptions, NdFrame};

/// One-dimensional labeled container.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    values: Vec<Scalar>,
    index: Index,
    dtype: DType,
    config: FrameConfig,
}

impl Series {
    /// Build from raw values. The name is the single supplied column name,
    /// or `"0"`.
    pub fn new(values: Vec<Scalar>, options: FrameOptions) -> Result<Self, FrameError> {
        let config = options.config.unwrap_or_default();
        let name = match options.columns {
            Some(mut names) if names.len() == 1 => names.remove(0),
            Some(names) => return Err(FrameError::shape("columns", 1, names.len())),
            None => "0".to_owned(),
        };
        let dtype = match options.dtypes.as_deref() {
            Some([dtype]) => *dtype,
            Some(other) => return Err(FrameError::shape("dtypes", 1, other.len())),
            None => infer_dtype(&values, config.dtype_sample_limit),
        };
        let index = options
            .index
            .map_or_else(|| Index::range(values.len()), Index::new);
        Self::from_parts(name, values, index, dtype, config)
    }

    /// Named series over a default range index with an inferred dtype.
    pub fn from_values(name: impl Into<String>, values: Vec<Scalar>) -> Result<Self, FrameError> {
        let name: String = name.into();
        Self::new(values, FrameOptions::default().columns([name]))
    }

    pub fn from_parts(
        name: impl Into<String>,
        values: Vec<Scalar>,
        index: Index,
        dtype: DType,
        config: FrameConfig,
    ) -> Result<Self, FrameError> {
        validate_index(&index, values.len())?;
        Ok(Self {
            name: name.into(),
            values,
            index,
            dtype,
            config,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn to_values(&self) -> Vec<Scalar> {
        self.values.clone()
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn config(&self) -> &FrameConfig {
        &self.config
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
    pub fn column(&self) -> Column {
        Column::new(self.dtype, self.values.clone())
    }

    /// Value stored under `label`.
    #[must_use]
    pub fn get(&self, label: &IndexLabel) -> Option<&Scalar> {
        self.index.position(label).map(|pos| &self.values[pos])
    }

    pub fn to_frame(&self) -> Result<DataFrame, FrameError> {
        DataFrame::from_parts(
            self.values.iter().map(|v| vec![v.clone()]).collect(),
            self.index.clone(),
            vec![self.name.clone()],
            vec![self.dtype],
            self.config,
        )
    }

    /// Same labels and config, new values and dtype.
    pub(crate) fn with_column_data(&self, column: Column) -> Result<Self, FrameError> {
        let dtype = column.dtype();
        Self::from_parts(
            self.name.clone(),
            column.into_values(),
            self.index.clone(),
            dtype,
            self.config,
        )
    }

    pub(crate) fn take_rows(&self, positions: &[usize]) -> Result<Self, FrameError> {
        let index = self.index.take(positions);
        if let Err(err) = index.validate_unique(Axis::Rows) {
            log::warn!("rejecting selection: {err}");
            return Err(err.into());
        }
        Self::from_parts(
            self.name.clone(),
            positions.iter().map(|&p| self.values[p].clone()).collect(),
            index,
            self.dtype,
            self.config,
        )
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

    /// Replace the values; the length must match the index. The dtype is
    /// inferred again.
    pub fn set_values(&mut self, values: Vec<Scalar>) -> Result<(), FrameError> {
        if values.len() != self.index.len() {
            return Err(FrameError::shape("values", self.index.len(), values.len()));
        }
        self.dtype = infer_dtype(&values, self.config.dtype_sample_limit);
        self.values = values;
        Ok(())
    }

    pub fn with_values(&self, values: Vec<Scalar>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_values(values)?;
        Ok(out)
    }

    pub fn rename_in_place(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn rename(&self, name: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.rename_in_place(name);
        out
    }

    pub fn astype_in_place(&mut self, dtype: DType) -> Result<(), FrameError> {
        let cast = self.column().cast(dtype)?;
        self.values = cast.into_values();
        self.dtype = dtype;
        Ok(())
    }

    pub fn astype(&self, dtype: DType) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.astype_in_place(dtype)?;
        Ok(out)
    }

    /// Stable sort; missing values go last.
    pub fn sort_values_in_place(&mut self, ascending: bool) -> Result<(), FrameError> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            compare_scalars_with_na_last(&self.values[a], &self.values[b], ascending)
        });
        *self = self.take_rows(&order)?;
        Ok(())
    }

    pub fn sort_values(&self, ascending: bool) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.sort_values_in_place(ascending)?;
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

    pub fn head(&self, n: usize) -> Result<Self, FrameError> {
        let end = n.min(self.len());
        self.iloc(&Selector::slice(&format!(":{end}")))
    }

    pub fn tail(&self, n: usize) -> Result<Self, FrameError> {
        let start = self.len() - n.min(self.len());
        self.iloc(&Selector::slice(&format!("{start}:")))
    }
}

impl NdFrame for Series {
    fn ndim(&self) -> usize {
        1
    }

    fn shape(&self) -> (usize, usize) {
        (self.values.len(), 1)
    }

    fn index(&self) -> &Index {
        &self.index
    }

    fn columns(&self) -> &[String] {
        std::slice::from_ref(&self.name)
    }

    fn dtypes(&self) -> &[DType] {
        std::slice::from_ref(&self.dtype)
    }

    fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn to_rows(&self) -> Vec<Vec<Scalar>> {
        self.values.iter().map(|v| vec![v.clone()]).collect()
    }
}
