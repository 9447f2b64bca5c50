use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use tempfile::env::temp_dir;

use crate::{
    config::StoreConfig,
    storage::{database::Database, memory::MemoryDatabase},
    types::error::Result,
};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub fn get_unix_timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Unique path in the temp directory. Tests run in parallel, so the
/// timestamp alone is not enough.
pub fn create_temp_db_path_with_prefix(prefix: &str) -> PathBuf {
    let mut temp_path = temp_dir();
    temp_path.push(format!(
        "{}_{}_{}_{}.db",
        prefix,
        std::process::id(),
        NEXT_ID.fetch_add(1, Ordering::Relaxed),
        get_unix_timestamp_millis()
    ));
    temp_path
}

pub fn create_temp_db_path() -> PathBuf {
    create_temp_db_path_with_prefix("lumbung_test")
}

/// A database path that is removed when the guard drops.
///
/// Keep the guard alive longer than any database opened on its path.
pub struct TempDatabase {
    pub path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        Self {
            path: create_temp_db_path(),
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            path: create_temp_db_path_with_prefix(prefix),
        }
    }

    pub fn open(&self) -> Result<Database> {
        Database::open(&self.path)
    }

    pub fn open_with_config(&self, config: StoreConfig) -> Result<Database> {
        Database::open_with_config(&self.path, config)
    }

    pub fn open_memory(&self) -> Result<MemoryDatabase> {
        MemoryDatabase::open(&self.path)
    }
}

impl Default for TempDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}
