use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::{
    config::StoreConfig,
    executor::table::MemoryTable,
    storage::{
        btree::BTree,
        schema::{Column, Columns},
    },
    types::{
        codec::{BinaryRead, BinaryWrite},
        error::{DatabaseError, Result},
        row::{Key, Record},
    },
    utils::hash::{checksum, verify_checksum},
};

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"LUMBUNG\0";
const HEADER_SIZE: usize = SNAPSHOT_MAGIC.len() + 4;

#[derive(Serialize, Deserialize)]
struct TableSnapshot {
    name: String,
    columns: Vec<Column>,
    rows: Vec<(Key, Record)>,
}

/// Writes every table to `path`, replacing the previous snapshot atomically.
///
/// Layout: magic, big-endian CRC32 of the payload, then the bincode payload
/// with tables in name order and rows in key order.
pub fn write_snapshot(path: &Path, tables: &HashMap<String, MemoryTable>) -> Result<()> {
    let mut names: Vec<&String> = tables.keys().collect();
    names.sort();

    let snapshot: Vec<TableSnapshot> = names
        .into_iter()
        .map(|name| {
            let table = &tables[name];
            Ok(TableSnapshot {
                name: name.clone(),
                columns: table.columns().columns().to_vec(),
                rows: table.entries().collect::<Result<Vec<_>>>()?,
            })
        })
        .collect::<Result<_>>()?;

    let payload = bincode::serde::encode_to_vec(&snapshot, bincode::config::standard())
        .map_err(|e| DatabaseError::SerializationError {
            details: e.to_string(),
        })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(SNAPSHOT_MAGIC)?;
    file.write_uint(checksum(&payload))?;
    file.write_all(&payload)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| DatabaseError::Io(e.error))?;

    info!(path = %path.display(), tables = snapshot.len(), "wrote snapshot");
    Ok(())
}

/// Loads the tables of a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path, config: &StoreConfig) -> Result<HashMap<String, MemoryTable>> {
    let bytes = fs::read(path)?;
    if bytes.len() < HEADER_SIZE || &bytes[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(DatabaseError::CorruptedDatabase {
            reason: format!("{} is not a snapshot file", path.display()),
        });
    }

    let expected = (&bytes[SNAPSHOT_MAGIC.len()..HEADER_SIZE]).read_uint()?;
    let payload = &bytes[HEADER_SIZE..];
    if !verify_checksum(payload, expected) {
        return Err(DatabaseError::CorruptedDatabase {
            reason: format!("snapshot checksum mismatch in {}", path.display()),
        });
    }

    let (snapshot, _): (Vec<TableSnapshot>, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            DatabaseError::SerializationError {
                details: e.to_string(),
            }
        })?;

    let mut tables = HashMap::with_capacity(snapshot.len());
    for table in snapshot {
        let columns = Columns::new(table.columns)?;
        let mut tree = BTree::with_order(config.btree_order)?;
        for (key, record) in table.rows {
            tree.insert(key, record);
        }
        tables.insert(table.name, MemoryTable::new(columns, tree));
    }

    info!(path = %path.display(), tables = tables.len(), "loaded snapshot");
    Ok(tables)
}
