use std::collections::BTreeMap;

use crate::{
    planner::expression::Node,
    storage::schema::Columns,
    types::{error::Result, row::{Key, Row}, value::Value},
};

/// One disjunct of a compiled predicate.
///
/// `pins` maps unique column positions to the value an equality fixed them
/// to. `conditions` are evaluated against whole rows. A frame matches a row
/// when every pin and every condition holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pins: BTreeMap<usize, Value>,
    conditions: Vec<Node>,
    always_false: bool,
}

impl Frame {
    pub fn pinned(column: usize, value: Value) -> Self {
        Self {
            pins: BTreeMap::from([(column, value)]),
            ..Self::default()
        }
    }

    pub fn condition(node: Node) -> Self {
        Self {
            conditions: vec![node],
            ..Self::default()
        }
    }

    pub fn always_false() -> Self {
        Self {
            always_false: true,
            ..Self::default()
        }
    }

    pub fn is_always_false(&self) -> bool {
        self.always_false
    }

    pub fn pins(&self) -> &BTreeMap<usize, Value> {
        &self.pins
    }

    pub fn conditions(&self) -> &[Node] {
        &self.conditions
    }

    /// Conjunction of two frames. Pinning one column to two different values
    /// yields an always-false frame.
    pub fn merge(&self, other: &Frame) -> Frame {
        if self.always_false || other.always_false {
            return Frame::always_false();
        }

        let mut pins = self.pins.clone();
        for (column, value) in &other.pins {
            match pins.get(column) {
                Some(existing) if existing != value => return Frame::always_false(),
                Some(_) => {}
                None => {
                    pins.insert(*column, value.clone());
                }
            }
        }

        let mut conditions = self.conditions.clone();
        conditions.extend(other.conditions.iter().cloned());
        Frame {
            pins,
            conditions,
            always_false: false,
        }
    }

    /// Whether the pins cover every unique column, so the frame names exactly one key.
    pub fn is_unique(&self, columns: &Columns) -> bool {
        !self.always_false && columns.unique_columns().all(|(i, _)| self.pins.contains_key(&i))
    }

    /// Index key named by a fully pinned frame.
    pub fn key(&self, columns: &Columns) -> Option<Key> {
        if self.always_false {
            return None;
        }
        columns
            .unique_columns()
            .map(|(i, _)| self.pins.get(&i).cloned())
            .collect()
    }

    pub fn check(&self, row: &Row, columns: &Columns) -> Result<bool> {
        if self.always_false {
            return Ok(false);
        }
        for (column, value) in &self.pins {
            if row.get_value(*column) != Some(value) {
                return Ok(false);
            }
        }
        for condition in &self.conditions {
            if !condition.test(row, columns)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
