//! In-memory collection of labeled variable rows for classifier training.

use std::cell::RefCell;

/// Collects one named row per scored relation when the `recording`
/// filter variant is active.
///
/// Interior mutability keeps the filter's scoring signature immutable;
/// the buffer is scoped to one filter instance and drained by the owner
/// after the event (or run) with [`Recorder::take_rows`].
#[derive(Debug)]
pub struct Recorder {
    columns: Vec<&'static str>,
    rows: RefCell<Vec<Vec<f64>>>,
}

impl Recorder {
    pub fn new(columns: Vec<&'static str>) -> Self {
        Self {
            columns,
            rows: RefCell::new(Vec::new()),
        }
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Append one row; the length must match the column list.
    pub fn record(&self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.borrow_mut().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    /// Drain the collected rows, leaving the recorder empty.
    pub fn take_rows(&self) -> Vec<Vec<f64>> {
        std::mem::take(&mut self.rows.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_accumulate_and_drain() {
        let rec = Recorder::new(vec!["chi2", "label"]);
        rec.record(vec![0.5, 1.0]);
        rec.record(vec![9.0, 0.0]);
        assert_eq!(rec.len(), 2);
        let rows = rec.take_rows();
        assert_eq!(rows.len(), 2);
        assert!(rec.is_empty());
    }
}
