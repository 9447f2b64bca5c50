use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{
    error::{DatabaseError, Result},
    row::{Key, Record, Row},
    value::{Value, ValueType},
};

/// A column definition in a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
    pub is_unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            is_unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

/// An ordered, non-empty table schema with at least one unique column.
///
/// The unique columns form the index key and the rest form the record, both
/// in schema order. [`Columns::make_key_value_pair`] and
/// [`Columns::make_values`] are inverses over full projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    columns: Vec<Column>,
}

impl Columns {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DatabaseError::InvalidSchema {
                reason: "a table needs at least one column".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatabaseError::InvalidSchema {
                    reason: format!("duplicate column name '{}'", column.name),
                });
            }
        }

        if !columns.iter().any(|c| c.is_unique) {
            return Err(DatabaseError::InvalidSchema {
                reason: "at least one column must be unique".to_string(),
            });
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DatabaseError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Unique columns with their schema positions.
    pub fn unique_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns.iter().enumerate().filter(|(_, c)| c.is_unique)
    }

    pub fn unique_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_unique).count()
    }

    /// Checks arity and per-column types of `row`.
    pub fn validate_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DatabaseError::ArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        for (column, value) in self.columns.iter().zip(&row.values) {
            if value.value_type() != column.value_type {
                return Err(DatabaseError::TypeMismatch {
                    expected: format!("{} for column '{}'", column.value_type, column.name),
                    actual: value.value_type().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn validate_projection<S: AsRef<str>>(&self, projection: &[S]) -> Result<()> {
        for name in projection {
            self.column(name.as_ref())?;
        }
        Ok(())
    }

    /// Splits a row into its key (unique columns) and record (the rest).
    pub fn make_key_value_pair(&self, row: Row) -> Result<(Key, Record)> {
        self.validate_row(&row)?;

        let unique = self.unique_count();
        let mut key = Vec::with_capacity(unique);
        let mut record = Vec::with_capacity(self.columns.len() - unique);
        for (column, value) in self.columns.iter().zip(row.into_values()) {
            if column.is_unique {
                key.push(value);
            } else {
                record.push(value);
            }
        }
        Ok((key, record))
    }

    /// Reassembles a row from a key and record, keeping only `projection`
    /// columns when it is non-empty. Values are always emitted in schema order.
    pub fn make_values<S: AsRef<str>>(
        &self,
        key: Key,
        record: Record,
        projection: &[S],
    ) -> Result<Row> {
        self.validate_projection(projection)?;

        let mut keys = key.into_iter();
        let mut records = record.into_iter();
        let mut values = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = if column.is_unique {
                keys.next()
            } else {
                records.next()
            };
            let value = value.ok_or_else(|| DatabaseError::CorruptedIndex {
                reason: format!("entry is missing a value for column '{}'", column.name),
            })?;
            if projection.is_empty() || projection.iter().any(|p| p.as_ref() == column.name) {
                values.push(value);
            }
        }
        Ok(Row::new(values))
    }

    /// Reassembles the full row.
    pub fn make_row(&self, key: Key, record: Record) -> Result<Row> {
        self.make_values::<&str>(key, record, &[])
    }

    pub fn get_value<'r>(&self, row: &'r Row, column: &str) -> Result<&'r Value> {
        let index = self
            .column_index(column)
            .ok_or_else(|| DatabaseError::UnknownColumn {
                name: column.to_string(),
            })?;
        row.get_value(index).ok_or(DatabaseError::ArityMismatch {
            expected: self.columns.len(),
            actual: row.len(),
        })
    }

    /// Restricts a full row to `projection`, in schema order.
    pub fn project<S: AsRef<str>>(&self, row: Row, projection: &[S]) -> Result<Row> {
        if projection.is_empty() {
            return Ok(row);
        }
        self.validate_projection(projection)?;
        let values = self
            .columns
            .iter()
            .zip(row.into_values())
            .filter(|(c, _)| projection.iter().any(|p| p.as_ref() == c.name))
            .map(|(_, v)| v)
            .collect();
        Ok(Row::new(values))
    }

    /// Estimated serialized size of one row, assuming `text_size_hint` bytes per text value.
    pub fn estimated_row_size(&self, text_size_hint: usize) -> usize {
        self.columns
            .iter()
            .map(|c| c.value_type.fixed_size().unwrap_or(4 + text_size_hint))
            .sum()
    }

    pub fn key_types(&self) -> Vec<ValueType> {
        self.columns
            .iter()
            .filter(|c| c.is_unique)
            .map(|c| c.value_type)
            .collect()
    }

    pub fn record_types(&self) -> Vec<ValueType> {
        self.columns
            .iter()
            .filter(|c| !c.is_unique)
            .map(|c| c.value_type)
            .collect()
    }
}
