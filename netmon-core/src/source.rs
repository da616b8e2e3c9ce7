//! Tabular data sources
//!
//! A source hands its column names and then every row, ordered by ascending
//! timestamp, to a [`RowVisitor`]. The first column of every source is the
//! internal row identifier.

use crate::columns;
use crate::error::{Error, Result};
use crate::types::{Cell, Sample};

/// Receives the contents of a [`TabularSource`].
pub trait RowVisitor {
    /// Called once, before any row, with every column name including the identifier.
    fn columns(&mut self, names: &[String]) -> Result<()>;

    /// Called once per row, in ascending timestamp order.
    fn row(&mut self, cells: &[Cell]) -> Result<()>;
}

/// An ordered, queryable collection of recorded rows.
pub trait TabularSource {
    /// Stream the whole table to `visitor`, ordered by timestamp.
    ///
    /// Fails with [`Error::SourceUnavailable`] before touching the visitor when
    /// the table cannot be read. Errors returned by the visitor are passed through.
    fn scan(&self, visitor: &mut dyn RowVisitor) -> Result<()>;
}

/// Table held in memory.
///
/// Rows are sorted by the `timestamp` column at scan time, so they may be
/// pushed in any order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    unreadable: bool,
}

impl MemorySource {
    /// Empty table with the given columns. `columns[0]` is the identifier.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            unreadable: false,
        }
    }

    /// Table with the full recorded schema, filled from `samples`.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut source = Self::new(
            std::iter::once(columns::ID).chain(columns::KNOWN_COLUMNS.iter().copied()),
        );
        for (i, sample) in samples.iter().enumerate() {
            let row = std::iter::once(Cell::Integer(i as i64 + 1))
                .chain(columns::KNOWN_COLUMNS.iter().map(|c| sample.get(c)))
                .collect();
            source.rows.push(row);
        }
        source
    }

    /// A source whose every scan fails, standing in for a missing table.
    pub fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    /// Append a row. It must have one cell per column.
    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.columns.len() {
            return Err(Error::SourceUnavailable(format!(
                "row has {} cells, table has {} columns",
                cells.len(),
                self.columns.len()
            )));
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TabularSource for MemorySource {
    fn scan(&self, visitor: &mut dyn RowVisitor) -> Result<()> {
        if self.unreadable || self.columns.is_empty() {
            return Err(Error::SourceUnavailable(
                "in-memory table has no schema".to_string(),
            ));
        }

        let mut ordered: Vec<&Vec<Cell>> = self.rows.iter().collect();
        if let Some(ts) = self.columns.iter().position(|c| c == columns::TIMESTAMP) {
            // Stable, so rows sharing a timestamp keep insertion order.
            ordered.sort_by_key(|row| match row[ts] {
                Cell::Timestamp(t) | Cell::Integer(t) => t,
                _ => i64::MIN,
            });
        }

        visitor.columns(&self.columns)?;
        for row in ordered {
            visitor.row(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    }

    impl RowVisitor for Collect {
        fn columns(&mut self, names: &[String]) -> Result<()> {
            self.columns = names.to_vec();
            Ok(())
        }

        fn row(&mut self, cells: &[Cell]) -> Result<()> {
            self.rows.push(cells.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_scan_orders_by_timestamp() {
        let mut source = MemorySource::new(["id", "timestamp", "reason"]);
        source
            .push_row(vec![Cell::Integer(1), Cell::Timestamp(300), Cell::Null])
            .unwrap();
        source
            .push_row(vec![Cell::Integer(2), Cell::Timestamp(100), Cell::Null])
            .unwrap();
        source
            .push_row(vec![Cell::Integer(3), Cell::Timestamp(200), Cell::Null])
            .unwrap();

        let mut collect = Collect::default();
        source.scan(&mut collect).unwrap();

        assert_eq!(collect.columns, vec!["id", "timestamp", "reason"]);
        let ids: Vec<_> = collect.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(
            ids,
            vec![Cell::Integer(2), Cell::Integer(3), Cell::Integer(1)]
        );
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut source = MemorySource::new(["id", "timestamp"]);
        assert!(source.push_row(vec![Cell::Integer(1)]).is_err());
        assert!(source.is_empty());
    }

    #[test]
    fn test_unreadable_never_visits() {
        let mut collect = Collect::default();
        let err = MemorySource::unreadable().scan(&mut collect).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert!(collect.columns.is_empty());
    }
}
