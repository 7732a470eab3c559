//! Plain-text rendering for frames and series.

use std::fmt;
use std::ops::Range;

use crate::{DataFrame, Series};

const ELLIPSIS: &str = "...";

/// Head and optional tail row ranges; at most `max_rows` rows in total.
fn visible_rows(len: usize, max_rows: usize) -> (Range<usize>, Option<Range<usize>>) {
    if len <= max_rows {
        return (0..len, None);
    }
    let head = max_rows.div_ceil(2);
    let tail = max_rows / 2;
    (0..head, Some(len - tail..len))
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let rendered: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:>width$}"))
        .collect();
    rendered.join("  ").trim_end().to_owned()
}

/// Right-aligned grid of `n_cols` columns. `elide_at` is the body row before
/// which a `...` row is written; `body.len()` puts it after the last row.
fn write_grid(
    f: &mut fmt::Formatter<'_>,
    n_cols: usize,
    header: Option<Vec<String>>,
    body: &[Vec<String>],
    elide_at: Option<usize>,
) -> fmt::Result {
    let mut widths = vec![0; n_cols];
    for row in header.iter().chain(body) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    if elide_at.is_some() {
        for width in &mut widths {
            *width = (*width).max(ELLIPSIS.len());
        }
    }

    let ellipsis = || render_line(std::iter::repeat_n(ELLIPSIS, n_cols), &widths);
    let mut lines = Vec::with_capacity(body.len() + 2);
    if let Some(header) = &header {
        lines.push(render_line(header.iter().map(String::as_str), &widths));
    }
    for (pos, row) in body.iter().enumerate() {
        if elide_at == Some(pos) {
            lines.push(ellipsis());
        }
        lines.push(render_line(row.iter().map(String::as_str), &widths));
    }
    if elide_at == Some(body.len()) {
        lines.push(ellipsis());
    }
    f.write_str(&lines.join("\n"))
}

fn rendered_positions(len: usize, max_rows: usize) -> (Vec<usize>, Option<usize>) {
    let (head, tail) = visible_rows(len, max_rows);
    let elide_at = tail.as_ref().map(|_| head.len());
    (head.chain(tail.unwrap_or_default()).collect(), elide_at)
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n_rows, n_cols) = self.shape();
        let (positions, elide_at) = rendered_positions(n_rows, self.config().max_display_rows);

        let header = std::iter::once(String::new())
            .chain(self.columns().iter().cloned())
            .collect();
        let labels = self.index().labels();
        let body: Vec<Vec<String>> = positions
            .iter()
            .map(|&row| {
                std::iter::once(labels[row].to_string())
                    .chain(self.values()[row].iter().map(ToString::to_string))
                    .collect()
            })
            .collect();

        write_grid(f, n_cols + 1, Some(header), &body, elide_at)?;
        if elide_at.is_some() {
            write!(f, "\n\n[{n_rows} rows x {n_cols} columns]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (positions, elide_at) = rendered_positions(self.len(), self.config().max_display_rows);
        let labels = self.index().labels();
        let body: Vec<Vec<String>> = positions
            .iter()
            .map(|&row| vec![labels[row].to_string(), self.values()[row].to_string()])
            .collect();

        write_grid(f, 2, None, &body, elide_at)?;
        if !body.is_empty() || elide_at.is_some() {
            f.write_str("\n")?;
        }
        if elide_at.is_some() {
            write!(f, "Name: {}, Length: {}, dtype: {}", self.name(), self.len(), self.dtype())
        } else {
            write!(f, "Name: {}, dtype: {}", self.name(), self.dtype())
        }
    }
}
