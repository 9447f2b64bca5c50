use std::path::Path;

use tracing::{info, warn};

use crate::{
    config::StoreConfig,
    executor::table::PersistentTable,
    storage::{
        descriptor::{ROOT_OFFSET, TableDescriptor},
        pager::Pager,
        paged_btree::PagedBTree,
        schema::Columns,
    },
    types::{
        DATABASE_DESCRIPTOR_SIZE, MAX_TABLE_COUNT, TABLE_DESCRIPTOR_SIZE,
        error::{DatabaseError, Result},
    },
};

/// File offset of descriptor slot `index`.
fn slot_offset(index: usize) -> u64 {
    (4 + index * TABLE_DESCRIPTOR_SIZE) as u64
}

/// A database file: a fixed descriptor region holding the table count and
/// one slot per table, followed by the node region shared by every table.
#[derive(Debug)]
pub struct Database {
    pager: Pager,
    config: StoreConfig,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let pager = Pager::open(path)?;

        let len = pager.len()?;
        if len == 0 {
            pager.write_at(0, &vec![0u8; DATABASE_DESCRIPTOR_SIZE])?;
            info!(path = %path.display(), "created database");
        } else if len < DATABASE_DESCRIPTOR_SIZE as u64 {
            return Err(DatabaseError::CorruptedDatabase {
                reason: format!(
                    "file is {} bytes, shorter than the {} byte descriptor region",
                    len, DATABASE_DESCRIPTOR_SIZE
                ),
            });
        } else {
            info!(path = %path.display(), "opened database");
        }

        let database = Self { pager, config };
        let count = database.table_count()?;
        if count > MAX_TABLE_COUNT {
            return Err(DatabaseError::CorruptedDatabase {
                reason: format!("table count {} exceeds {}", count, MAX_TABLE_COUNT),
            });
        }
        Ok(database)
    }

    pub fn path(&self) -> &Path {
        self.pager.path()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn table_count(&self) -> Result<usize> {
        Ok(self.pager.read_uint_at(0)? as usize)
    }

    fn set_table_count(&self, count: usize) -> Result<()> {
        self.pager.write_uint_at(0, count as u32)
    }

    fn descriptor(&self, index: usize) -> Result<TableDescriptor> {
        let mut buf = vec![0u8; TABLE_DESCRIPTOR_SIZE];
        self.pager.read_at(slot_offset(index), &mut buf)?;
        TableDescriptor::decode(&buf)
    }

    fn find(&self, name: &str) -> Result<Option<(usize, TableDescriptor)>> {
        for index in 0..self.table_count()? {
            let descriptor = self.descriptor(index)?;
            if descriptor.name == name {
                return Ok(Some((index, descriptor)));
            }
        }
        Ok(None)
    }

    fn open_table(&self, index: usize, descriptor: TableDescriptor) -> PersistentTable<'_> {
        let root_slot = slot_offset(index) + ROOT_OFFSET as u64;
        let tree = PagedBTree::new(&self.pager, &descriptor.columns, root_slot, &self.config);
        PersistentTable::new(descriptor.columns, tree)
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find(name)?.is_some())
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        (0..self.table_count()?)
            .map(|i| self.descriptor(i).map(|d| d.name))
            .collect()
    }

    /// Creates an empty table in the next free descriptor slot.
    pub fn make_table(&self, name: &str, columns: Columns) -> Result<PersistentTable<'_>> {
        let descriptor = TableDescriptor::new(name, columns)?;
        if self.table_exists(name)? {
            return Err(DatabaseError::TableExists {
                name: name.to_string(),
            });
        }
        let count = self.table_count()?;
        if count >= MAX_TABLE_COUNT {
            return Err(DatabaseError::TableCapacityExceeded {
                max: MAX_TABLE_COUNT,
            });
        }

        self.pager.write_at(slot_offset(count), &descriptor.encode()?)?;
        self.set_table_count(count + 1)?;
        info!(table = name, slot = count, "created table");
        Ok(self.open_table(count, descriptor))
    }

    pub fn get_table(&self, name: &str) -> Result<PersistentTable<'_>> {
        let (index, descriptor) = self.find(name)?.ok_or_else(|| DatabaseError::TableNotFound {
            name: name.to_string(),
        })?;
        Ok(self.open_table(index, descriptor))
    }

    /// Removes a table from the catalog. The last descriptor moves into the
    /// freed slot; the dropped table's nodes stay in the file unreferenced.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let (index, _) = self.find(name)?.ok_or_else(|| DatabaseError::TableNotFound {
            name: name.to_string(),
        })?;
        let last = self.table_count()? - 1;
        if index != last {
            let mut buf = vec![0u8; TABLE_DESCRIPTOR_SIZE];
            self.pager.read_at(slot_offset(last), &mut buf)?;
            self.pager.write_at(slot_offset(index), &buf)?;
        }
        self.pager
            .write_at(slot_offset(last), &vec![0u8; TABLE_DESCRIPTOR_SIZE])?;
        self.set_table_count(last)?;
        info!(table = name, "dropped table");
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.pager.sync()
    }

    /// Flushes the file and closes it, reporting any failure.
    pub fn close(self) -> Result<()> {
        self.sync()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.pager.sync() {
            warn!(path = %self.pager.path().display(), error = %e, "failed to sync database on drop");
        }
    }
}
