use crate::types::{error::Result, row::Row};

/// Row insertion into a table
pub trait Inserter {
    /// Insert a single row, replacing any row with the same key
    fn insert(&mut self, row: Row) -> Result<()>;

    /// Insert rows in order, stopping at the first failure
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<usize> {
        let count = rows.len();
        for row in rows {
            self.insert(row)?;
        }
        Ok(count)
    }
}
