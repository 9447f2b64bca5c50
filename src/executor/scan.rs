use crate::{
    storage::{
        index::{Entries, OrderedIndex},
        schema::Columns,
    },
    types::{
        error::Result,
        row::{Key, Record, Row},
    },
};

pub trait Scanner {
    fn scan(&mut self) -> Result<Option<Row>>;

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(batch_size);
        while rows.len() < batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<()>;
}

pub struct ScanIterator<S: Scanner> {
    scanner: S,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }

    pub fn into_inner(self) -> S {
        self.scanner
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scanner.scan() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Full scan of a table's index in key order, projecting each row.
pub struct TableScanner<'a, I> {
    columns: &'a Columns,
    index: &'a I,
    projection: Vec<String>,
    entries: Entries<'a, Key, Record>,
}

impl<'a, I: OrderedIndex<Key, Record>> TableScanner<'a, I> {
    pub fn new(columns: &'a Columns, index: &'a I, projection: Vec<String>) -> Result<Self> {
        columns.validate_projection(&projection)?;
        Ok(Self {
            columns,
            index,
            projection,
            entries: index.entries(),
        })
    }
}

impl<I: OrderedIndex<Key, Record>> Scanner for TableScanner<'_, I> {
    fn scan(&mut self) -> Result<Option<Row>> {
        match self.entries.next() {
            Some(entry) => {
                let (key, record) = entry?;
                self.columns
                    .make_values(key, record, &self.projection)
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.entries = self.index.entries();
        Ok(())
    }
}
