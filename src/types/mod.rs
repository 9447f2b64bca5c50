pub mod codec;
pub mod error;
pub mod row;
pub mod value;

// On-disk node pointer: a byte offset into the database file, 0 meaning "no node"
pub type NodePtr = u32;
pub const NULL_PTR: NodePtr = 0;

// Node pages
pub const PAGE_SIZE: usize = 4096;
pub const MINIMUM_BTREE_ORDER: usize = 5;
pub const DEFAULT_BTREE_ORDER: usize = 3;
pub const TEXT_SIZE_HINT: usize = 32;
pub const POINTER_SIZE: usize = 4;
pub const NODE_HEADER_SIZE: usize = 16; // capacity(4) | parent(4) | item_count(4) | leftmost_child(4)

// Database descriptor region
pub const DATABASE_DESCRIPTOR_SIZE: usize = 32765;
pub const MAX_TABLE_NAME_SIZE: usize = 20;
pub const MAX_TABLE_COLUMN_COUNT: usize = 20;
pub const MAX_TABLE_COLUMN_NAME_SIZE: usize = 20;
pub const COLUMN_DESCRIPTOR_SIZE: usize = 4 + MAX_TABLE_COLUMN_NAME_SIZE + 1 + 1;
pub const TABLE_DESCRIPTOR_SIZE: usize =
    4 + MAX_TABLE_NAME_SIZE + 4 + MAX_TABLE_COLUMN_COUNT * COLUMN_DESCRIPTOR_SIZE + 4;
pub const MAX_TABLE_COUNT: usize = (DATABASE_DESCRIPTOR_SIZE - 4) / TABLE_DESCRIPTOR_SIZE;
