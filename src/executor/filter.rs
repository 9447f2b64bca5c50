use std::collections::BTreeSet;

use crate::{
    planner::frame::Frame,
    storage::{
        index::{Entries, OrderedIndex},
        schema::Columns,
    },
    types::{
        error::{DatabaseError, Result},
        row::{Key, Record, Row},
    },
};

/// Frames split by how they execute.
#[derive(Debug, Default)]
pub struct FramePlan {
    /// Fully pinned frames, resolved by point lookup.
    pub lookups: Vec<(Key, Frame)>,
    /// Frames tested against every row of one ascending scan.
    pub scanned: Vec<Frame>,
}

impl FramePlan {
    pub fn new(frames: Vec<Frame>, columns: &Columns) -> Self {
        let mut plan = FramePlan::default();
        for frame in frames {
            match frame.key(columns) {
                Some(key) => plan.lookups.push((key, frame)),
                None => plan.scanned.push(frame),
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty() && self.scanned.is_empty()
    }
}

/// Looks up a pinned key and checks its frame. A missing key is no match.
pub fn lookup<I: OrderedIndex<Key, Record>>(
    index: &I,
    columns: &Columns,
    key: &Key,
    frame: &Frame,
) -> Result<Option<Row>> {
    let record = match index.get(key) {
        Ok(record) => record,
        Err(DatabaseError::KeyNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let row = columns.make_row(key.clone(), record)?;
    Ok(frame.check(&row, columns)?.then_some(row))
}

/// Whether any of `frames` matches `row`.
pub fn matches_any(frames: &[Frame], row: &Row, columns: &Columns) -> Result<bool> {
    for frame in frames {
        if frame.check(row, columns)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Lazy filtered select: point lookups first, then one scan for the rest.
///
/// Each key is emitted at most once, even when several frames match it.
pub struct FilterIterator<'a, I> {
    columns: &'a Columns,
    index: &'a I,
    projection: Vec<String>,
    lookups: std::vec::IntoIter<(Key, Frame)>,
    scanned: Vec<Frame>,
    processed: BTreeSet<Key>,
    entries: Option<Entries<'a, Key, Record>>,
    done: bool,
}

impl<'a, I: OrderedIndex<Key, Record>> FilterIterator<'a, I> {
    pub fn new(columns: &'a Columns, index: &'a I, plan: FramePlan, projection: Vec<String>) -> Self {
        Self {
            columns,
            index,
            projection,
            lookups: plan.lookups.into_iter(),
            scanned: plan.scanned,
            processed: BTreeSet::new(),
            entries: None,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<Row>> {
        for (key, frame) in self.lookups.by_ref() {
            if self.processed.contains(&key) {
                continue;
            }
            if let Some(row) = lookup(self.index, self.columns, &key, &frame)? {
                self.processed.insert(key);
                return self.columns.project(row, &self.projection).map(Some);
            }
        }

        if self.scanned.is_empty() {
            return Ok(None);
        }
        let index = self.index;
        let entries = self.entries.get_or_insert_with(|| index.entries());
        for entry in entries {
            let (key, record) = entry?;
            if self.processed.contains(&key) {
                continue;
            }
            let row = self.columns.make_row(key, record)?;
            if matches_any(&self.scanned, &row, self.columns)? {
                return self.columns.project(row, &self.projection).map(Some);
            }
        }
        Ok(None)
    }
}

impl<I: OrderedIndex<Key, Record>> Iterator for FilterIterator<'_, I> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result.transpose()
    }
}
