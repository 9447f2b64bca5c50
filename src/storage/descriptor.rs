use std::io::Cursor;

use crate::{
    storage::schema::{Column, Columns},
    types::{
        COLUMN_DESCRIPTOR_SIZE, MAX_TABLE_COLUMN_COUNT, MAX_TABLE_COLUMN_NAME_SIZE,
        MAX_TABLE_NAME_SIZE, NodePtr, TABLE_DESCRIPTOR_SIZE,
        codec::{BinaryRead, BinaryWrite},
        error::{DatabaseError, Result},
        value::ValueType,
    },
};

// Field offsets inside a table descriptor
const COLUMN_COUNT_OFFSET: usize = 4 + MAX_TABLE_NAME_SIZE;
const COLUMNS_OFFSET: usize = COLUMN_COUNT_OFFSET + 4;
pub const ROOT_OFFSET: usize = TABLE_DESCRIPTOR_SIZE - 4;

/// Fixed-size catalog entry for one persistent table.
///
/// ```text
/// [name len u32][name, zero padded to 20]
/// [column count u32]
/// 20 x [name len u32][name, zero padded to 20][type tag u8][unique u8]
/// [root pointer u32]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Columns,
    pub root: NodePtr,
}

impl TableDescriptor {
    pub fn new(name: &str, columns: Columns) -> Result<Self> {
        validate_limits(name, &columns)?;
        Ok(Self {
            name: name.to_string(),
            columns,
            root: 0,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        validate_limits(&self.name, &self.columns)?;

        let mut buf = Vec::with_capacity(TABLE_DESCRIPTOR_SIZE);
        write_padded(&mut buf, &self.name, MAX_TABLE_NAME_SIZE)?;
        buf.write_uint(self.columns.len() as u32)?;
        for column in self.columns.columns() {
            write_padded(&mut buf, &column.name, MAX_TABLE_COLUMN_NAME_SIZE)?;
            buf.write_byte(column.value_type.as_tag())?;
            buf.write_bool(column.is_unique)?;
        }
        buf.fill(ROOT_OFFSET - buf.len())?;
        buf.write_uint(self.root)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TABLE_DESCRIPTOR_SIZE {
            return Err(DatabaseError::CorruptedDatabase {
                reason: format!(
                    "table descriptor is {} bytes, expected {}",
                    bytes.len(),
                    TABLE_DESCRIPTOR_SIZE
                ),
            });
        }

        let mut cursor = Cursor::new(bytes);
        let name = read_padded(&mut cursor, MAX_TABLE_NAME_SIZE)?;
        let count = cursor.read_uint()? as usize;
        if count > MAX_TABLE_COLUMN_COUNT {
            return Err(DatabaseError::CorruptedDatabase {
                reason: format!("table '{}' claims {} columns", name, count),
            });
        }

        let mut columns = Vec::with_capacity(count);
        for i in 0..count {
            cursor.set_position((COLUMNS_OFFSET + i * COLUMN_DESCRIPTOR_SIZE) as u64);
            let column_name = read_padded(&mut cursor, MAX_TABLE_COLUMN_NAME_SIZE)?;
            let value_type = ValueType::from_tag(cursor.read_byte()?)?;
            let mut column = Column::new(column_name, value_type);
            column.is_unique = cursor.read_bool()?;
            columns.push(column);
        }

        cursor.set_position(ROOT_OFFSET as u64);
        let root = cursor.read_uint()?;

        Ok(Self {
            name,
            columns: Columns::new(columns)?,
            root,
        })
    }
}

/// Rejects names and schemas that do not fit a descriptor slot.
pub fn validate_limits(name: &str, columns: &Columns) -> Result<()> {
    if name.is_empty() {
        return Err(DatabaseError::InvalidSchema {
            reason: "table name cannot be empty".to_string(),
        });
    }
    if name.len() > MAX_TABLE_NAME_SIZE {
        return Err(DatabaseError::TableNameTooLong {
            name: name.to_string(),
            max: MAX_TABLE_NAME_SIZE,
        });
    }
    if columns.len() > MAX_TABLE_COLUMN_COUNT {
        return Err(DatabaseError::TooManyColumns {
            count: columns.len(),
            max: MAX_TABLE_COLUMN_COUNT,
        });
    }
    if let Some(column) = columns
        .columns()
        .iter()
        .find(|c| c.name.len() > MAX_TABLE_COLUMN_NAME_SIZE)
    {
        return Err(DatabaseError::ColumnNameTooLong {
            name: column.name.clone(),
            max: MAX_TABLE_COLUMN_NAME_SIZE,
        });
    }
    Ok(())
}

fn write_padded(buf: &mut Vec<u8>, text: &str, width: usize) -> Result<()> {
    buf.write_string(text)?;
    buf.fill(width - text.len())
}

fn read_padded(cursor: &mut Cursor<&[u8]>, width: usize) -> Result<String> {
    let start = cursor.position();
    let len = cursor.read_uint()? as usize;
    if len > width {
        return Err(DatabaseError::CorruptedDatabase {
            reason: format!("name of {} bytes in a {} byte field", len, width),
        });
    }
    cursor.set_position(start);
    let text = cursor.read_string()?;
    cursor.set_position(start + 4 + width as u64);
    Ok(text)
}
