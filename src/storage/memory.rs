use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    config::StoreConfig,
    executor::table::MemoryTable,
    storage::{
        btree::BTree,
        schema::Columns,
        snapshot::{read_snapshot, write_snapshot},
    },
    types::error::{DatabaseError, Result},
};

/// Catalog of in-memory tables.
///
/// When opened with a path, the tables are loaded from a snapshot at that
/// path (if one exists) and written back on [`MemoryDatabase::sync`],
/// [`MemoryDatabase::close`] and, best effort, on drop.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: HashMap<String, MemoryTable>,
    path: Option<PathBuf>,
    config: StoreConfig,
}

impl MemoryDatabase {
    /// Transient database that is never written anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tables: HashMap::new(),
            path: None,
            config,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            read_snapshot(&path, &config)?
        } else {
            info!(path = %path.display(), "starting empty snapshot database");
            HashMap::new()
        };
        Ok(Self {
            tables,
            path: Some(path),
            config,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn make_table(&mut self, name: &str, columns: Columns) -> Result<&mut MemoryTable> {
        if name.is_empty() {
            return Err(DatabaseError::InvalidSchema {
                reason: "table name cannot be empty".to_string(),
            });
        }
        if self.tables.contains_key(name) {
            return Err(DatabaseError::TableExists {
                name: name.to_string(),
            });
        }

        let tree = BTree::with_order(self.config.btree_order)?;
        info!(table = name, "created table");
        Ok(self
            .tables
            .entry(name.to_string())
            .or_insert(MemoryTable::new(columns, tree)))
    }

    pub fn get_table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables.get(name).ok_or_else(|| DatabaseError::TableNotFound {
            name: name.to_string(),
        })
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.tables
            .remove(name)
            .map(|_| info!(table = name, "dropped table"))
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Writes the snapshot. Does nothing for a transient database.
    pub fn sync(&self) -> Result<()> {
        match &self.path {
            Some(path) => write_snapshot(path, &self.tables),
            None => Ok(()),
        }
    }

    /// Writes the snapshot and closes the database, reporting any failure.
    pub fn close(mut self) -> Result<()> {
        let result = self.sync();
        self.path = None;
        result
    }
}

impl Drop for MemoryDatabase {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            if let Err(e) = write_snapshot(path, &self.tables) {
                warn!(path = %path.display(), error = %e, "failed to write snapshot on drop");
            }
        }
    }
}
