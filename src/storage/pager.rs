use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::types::{
    NodePtr,
    codec::{BinaryRead, BinaryWrite},
    error::{DatabaseError, Result},
};

/// Offset-addressed access to the database file.
///
/// Every call seeks explicitly before reading or writing, so no operation
/// depends on where a previous one left the cursor. All methods take `&self`
/// (`&File` implements `Read`, `Write` and `Seek`), which lets several table
/// handles share one pager.
#[derive(Debug)]
pub struct Pager {
    file: File,
    path: PathBuf,
}

impl Pager {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    /// Buffered reader positioned at `offset`.
    pub fn reader_at(&self, offset: u64) -> Result<BufReader<&File>> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        Ok(BufReader::new(file))
    }

    pub fn write_at(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(bytes)?;
        Ok(())
    }

    /// Writes `bytes` at the end of the file and returns where they start.
    pub fn append(&self, bytes: &[u8]) -> Result<u64> {
        let mut file = &self.file;
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(bytes)?;
        Ok(offset)
    }

    /// Offset the next [`Pager::append`] will write at, as a node pointer.
    pub fn next_node_ptr(&self) -> Result<NodePtr> {
        let offset = self.len()?;
        NodePtr::try_from(offset).map_err(|_| DatabaseError::StorageFull { offset })
    }

    pub fn read_uint_at(&self, offset: u64) -> Result<u32> {
        self.reader_at(offset)?.read_uint()
    }

    pub fn write_uint_at(&self, offset: u64, value: u32) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.write_uint(value)
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
