use crate::spreadsheet::cell::Cell;
use std::collections::BTreeMap;

/// Cells of one worksheet in document order (row-major).
#[derive(Clone, Debug)]
pub(crate) struct Sheet {
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Groups the cells into records, one per row that holds at least one
    /// cell, paired with its 0-based row index. The first such row is the
    /// header: its column span fixes the record width, and cells outside it
    /// are dropped. Gaps inside the span are `None`.
    pub(crate) fn records(&self) -> Vec<(usize, Vec<Option<&Cell>>)> {
        let mut rows = BTreeMap::<usize, Vec<&Cell>>::new();
        for cell in &self.cells {
            rows.entry(cell.row).or_default().push(cell);
        }
        let Some(header) = rows.values().next() else {
            return Vec::new();
        };
        let (Some(col_lower), Some(col_upper)) = (
            header.iter().map(|cell| cell.col).min(),
            header.iter().map(|cell| cell.col).max(),
        ) else {
            return Vec::new();
        };
        let width = col_upper - col_lower + 1;

        rows.into_iter()
            .map(|(row, cells)| {
                let mut record = vec![None; width];
                for cell in cells.into_iter().filter(|cell| (col_lower..=col_upper).contains(&cell.col)) {
                    // Later duplicates of the same reference win, as in spreadsheet apps
                    record[cell.col - col_lower] = Some(cell);
                }
                (row, record)
            })
            .collect()
    }
}
