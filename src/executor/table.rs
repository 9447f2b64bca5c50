use tracing::trace;

use crate::{
    executor::{
        delete::delete_where,
        filter::{FilterIterator, FramePlan},
        insert::Inserter,
        scan::{ScanIterator, TableScanner},
    },
    planner::compiler::compile_predicate,
    storage::{btree::BTree, index::OrderedIndex, paged_btree::PagedBTree, schema::Columns},
    types::{
        error::Result,
        row::{Key, Record, Row},
    },
};

/// A schema bound to an ordered index.
///
/// Rows go through the schema codec on their way in and out: the unique
/// columns become the index key and the rest the stored record.
#[derive(Debug, Clone)]
pub struct Table<I> {
    columns: Columns,
    index: I,
}

/// Table held entirely in memory.
pub type MemoryTable = Table<BTree<Key, Record>>;

/// Table stored in a database file.
pub type PersistentTable<'p> = Table<PagedBTree<'p>>;

impl<I: OrderedIndex<Key, Record>> Table<I> {
    pub fn new(columns: Columns, index: I) -> Self {
        Self { columns, index }
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn len(&self) -> Result<usize> {
        self.index.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.index.is_empty()
    }

    /// Inserts `row`, replacing any row with the same key.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        let (key, record) = self.columns.make_key_value_pair(row)?;
        trace!(?key, "inserting row");
        self.index.insert(key, record)
    }

    /// Full row stored under `key`.
    pub fn get(&self, key: &Key) -> Result<Row> {
        let record = self.index.get(key)?;
        self.columns.make_row(key.clone(), record)
    }

    pub fn contains(&self, key: &Key) -> Result<bool> {
        self.index.contains(key)
    }

    /// All rows in key order, restricted to `projection` unless it is empty.
    pub fn select(&self, projection: &[&str]) -> Result<ScanIterator<TableScanner<'_, I>>> {
        let scanner = TableScanner::new(&self.columns, &self.index, owned(projection))?;
        Ok(ScanIterator::new(scanner))
    }

    /// Rows matching `predicate`, restricted to `projection` unless it is empty.
    pub fn select_where(
        &self,
        predicate: &str,
        projection: &[&str],
    ) -> Result<FilterIterator<'_, I>> {
        self.columns.validate_projection(projection)?;
        let frames = compile_predicate(predicate, &self.columns)?;
        let plan = FramePlan::new(frames, &self.columns);
        Ok(FilterIterator::new(
            &self.columns,
            &self.index,
            plan,
            owned(projection),
        ))
    }

    /// Deletes the rows matching `predicate` and returns how many were removed.
    pub fn delete(&mut self, predicate: &str) -> Result<usize> {
        let frames = compile_predicate(predicate, &self.columns)?;
        let plan = FramePlan::new(frames, &self.columns);
        delete_where(&mut self.index, &self.columns, plan)
    }

    /// Entries as stored, in key order.
    pub fn entries(&self) -> impl Iterator<Item = Result<(Key, Record)>> + '_ {
        self.index.entries()
    }
}

impl<I: OrderedIndex<Key, Record>> Inserter for Table<I> {
    fn insert(&mut self, row: Row) -> Result<()> {
        Table::insert(self, row)
    }
}

fn owned(projection: &[&str]) -> Vec<String> {
    projection.iter().map(|p| p.to_string()).collect()
}
