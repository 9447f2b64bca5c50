use tracing::debug;

use crate::{
    executor::filter::{FramePlan, lookup, matches_any},
    storage::{index::OrderedIndex, schema::Columns},
    types::{
        error::{DatabaseError, Result},
        row::{Key, Record},
    },
};

/// Deletes every row matched by `plan` and returns how many were removed.
///
/// Pinned keys are deleted as they are looked up. Scanned matches are
/// collected first and deleted after the scan, so the index is never mutated
/// while it is being iterated.
pub fn delete_where<I: OrderedIndex<Key, Record>>(
    index: &mut I,
    columns: &Columns,
    plan: FramePlan,
) -> Result<usize> {
    if !index.supports_delete() {
        return Err(DatabaseError::UnsupportedOperation {
            operation: "delete on a persistent table".to_string(),
        });
    }

    let mut deleted = Vec::new();
    for (key, frame) in &plan.lookups {
        if deleted.contains(key) {
            continue;
        }
        if lookup(&*index, columns, key, frame)?.is_some() {
            index.delete(key)?;
            deleted.push(key.clone());
        }
    }
    let pinned = deleted.len();

    if !plan.scanned.is_empty() {
        let mut doomed = Vec::new();
        for entry in index.entries() {
            let (key, record) = entry?;
            let row = columns.make_row(key.clone(), record)?;
            if matches_any(&plan.scanned, &row, columns)? {
                doomed.push(key);
            }
        }
        for key in &doomed {
            index.delete(key)?;
        }
        deleted.extend(doomed);
    }

    debug!(pinned, scanned = deleted.len() - pinned, "deleted rows");
    Ok(deleted.len())
}
