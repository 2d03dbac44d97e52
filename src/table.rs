use crate::block::{InlineRun, Row, Table};
use crate::inline::format_inline;

/// Collects the rows of one table until [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct TableAccumulator {
    header: Option<Row>,
    rows: Vec<Row>,
    fed: usize,
}

impl TableAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        let row = cells
            .iter()
            .map(|cell| format_inline(cell.as_ref()))
            .collect();
        self.rows.push(row);
        self.fed += 1;
    }

    /// The alignment row. It never becomes data; right after the first row
    /// it promotes that row to the header.
    pub fn feed_separator_row(&mut self) {
        if self.fed == 1 && self.header.is_none() {
            self.header = self.rows.pop();
        }
        self.fed += 1;
    }

    /// Pad every row to the widest row and return the table.
    pub fn finish(self) -> Table {
        let column_count = self
            .header
            .iter()
            .chain(&self.rows)
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let pad = |mut row: Row| {
            row.resize_with(column_count, InlineRun::new);
            row
        };

        Table {
            header: self.header.map(pad),
            rows: self.rows.into_iter().map(pad).collect(),
            column_count,
        }
    }
}

/// Split a `| a | b |` line into trimmed cells. The leading pipe is
/// required, the trailing one optional.
pub fn split_row(line: &str) -> Vec<&str> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

/// Whether the cells form an alignment row such as `|---|:--:|`.
pub fn is_separator_row(cells: &[&str]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            !cell.is_empty() && cell.contains('-') && cell.chars().all(|c| matches!(c, '-' | ':'))
        })
}
