use serde::{Deserialize, Serialize};

use crate::types::{
    DEFAULT_BTREE_ORDER, MINIMUM_BTREE_ORDER, NODE_HEADER_SIZE, PAGE_SIZE, TEXT_SIZE_HINT,
    error::{DatabaseError, Result},
};

/// Tunables shared by both backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Order of in-memory B-trees.
    pub btree_order: usize,
    /// Target serialized size of a persistent node.
    pub page_size: usize,
    /// Floor of the derived persistent order.
    pub minimum_order: usize,
    /// Assumed text payload per text column when sizing persistent nodes.
    pub text_size_hint: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            btree_order: DEFAULT_BTREE_ORDER,
            page_size: PAGE_SIZE,
            minimum_order: MINIMUM_BTREE_ORDER,
            text_size_hint: TEXT_SIZE_HINT,
        }
    }
}

impl StoreConfig {
    pub fn with_btree_order(mut self, order: usize) -> Self {
        self.btree_order = order;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_minimum_order(mut self, minimum_order: usize) -> Self {
        self.minimum_order = minimum_order;
        self
    }

    pub fn with_text_size_hint(mut self, hint: usize) -> Self {
        self.text_size_hint = hint;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.btree_order < 3 {
            return Err(DatabaseError::InvalidConfig {
                reason: format!("btree_order must be at least 3, got {}", self.btree_order),
            });
        }
        if self.minimum_order < 3 {
            return Err(DatabaseError::InvalidConfig {
                reason: format!(
                    "minimum_order must be at least 3, got {}",
                    self.minimum_order
                ),
            });
        }
        if self.page_size <= NODE_HEADER_SIZE {
            return Err(DatabaseError::InvalidConfig {
                reason: format!(
                    "page_size must exceed the {} byte node header, got {}",
                    NODE_HEADER_SIZE, self.page_size
                ),
            });
        }
        Ok(())
    }
}
