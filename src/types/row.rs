use serde::{Deserialize, Serialize};

use crate::types::value::Value;

/// Values of the unique columns of a row, in schema order.
pub type Key = Vec<Value>;

/// Values of the non-unique columns of a row, in schema order.
pub type Record = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn size(&self) -> usize {
        self.values.iter().map(Value::serialized_size).sum()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Builds a [`Row`] from anything convertible into [`Value`].
///
/// ```
/// use lumbung::{row, types::value::Value};
/// let row = row![1, "alice", true];
/// assert_eq!(row.values[1], Value::Text("alice".to_string()));
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::types::row::Row::new(vec![$($crate::types::value::Value::from($value)),*])
    };
}
