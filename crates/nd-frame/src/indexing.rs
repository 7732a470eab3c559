//! `iloc`/`loc` materialisation on top of the selector resolver.
//!
//! Resolution yields a row position list and a column position list; the
//! new container is gathered from them. Views are copies, never aliases.

use nd_index::{Axis, Index, IndexMode, Selector, resolve_positions};
use serde_json::Value;

use crate::{DataFrame, FrameError, Series};

impl DataFrame {
    /// Resolve both selectors and gather the result.
    pub fn select(
        &self,
        rows: &Selector,
        columns: &Selector,
        mode: IndexMode,
    ) -> Result<Self, FrameError> {
        let row_positions = resolve_positions(self.index(), rows, mode, Axis::Rows)?;
        let column_index = Index::from_utf8(self.columns().to_vec());
        let column_positions = resolve_positions(&column_index, columns, mode, Axis::Columns)?;
        self.gather(&row_positions, &column_positions)
    }

    pub fn iloc(&self, rows: &Selector, columns: &Selector) -> Result<Self, FrameError> {
        self.select(rows, columns, IndexMode::Position)
    }

    pub fn loc(&self, rows: &Selector, columns: &Selector) -> Result<Self, FrameError> {
        self.select(rows, columns, IndexMode::Label)
    }

    /// `iloc` with JSON selectors; an absent or null selector means "all".
    pub fn iloc_json(&self, rows: Option<&Value>, columns: Option<&Value>) -> Result<Self, FrameError> {
        self.iloc(
            &Selector::from_json(rows, Axis::Rows)?,
            &Selector::from_json(columns, Axis::Columns)?,
        )
    }

    pub fn loc_json(&self, rows: Option<&Value>, columns: Option<&Value>) -> Result<Self, FrameError> {
        self.loc(
            &Selector::from_json(rows, Axis::Rows)?,
            &Selector::from_json(columns, Axis::Columns)?,
        )
    }

    /// `loc` with a series as the row selector: its values are the selector.
    pub fn loc_by_series(&self, rows: &Series, columns: &Selector) -> Result<Self, FrameError> {
        self.loc(&rows.to_selector()?, columns)
    }

    pub fn iloc_by_series(&self, rows: &Series, columns: &Selector) -> Result<Self, FrameError> {
        self.iloc(&rows.to_selector()?, columns)
    }
}

impl Series {
    pub fn select(&self, rows: &Selector, mode: IndexMode) -> Result<Self, FrameError> {
        let positions = resolve_positions(self.index(), rows, mode, Axis::Rows)?;
        self.take_rows(&positions)
    }

    pub fn iloc(&self, rows: &Selector) -> Result<Self, FrameError> {
        self.select(rows, IndexMode::Position)
    }

    pub fn loc(&self, rows: &Selector) -> Result<Self, FrameError> {
        self.select(rows, IndexMode::Label)
    }

    pub fn iloc_json(&self, rows: Option<&Value>) -> Result<Self, FrameError> {
        self.iloc(&Selector::from_json(rows, Axis::Rows)?)
    }

    pub fn loc_json(&self, rows: Option<&Value>) -> Result<Self, FrameError> {
        self.loc(&Selector::from_json(rows, Axis::Rows)?)
    }

    /// The values of this series as a row selector.
    pub fn to_selector(&self) -> Result<Selector, FrameError> {
        Ok(Selector::from_scalars(self.values(), Axis::Rows)?)
    }
}
