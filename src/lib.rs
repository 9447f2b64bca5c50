//! An embeddable mini relational store.
//!
//! Tables pair a [`Columns`] schema with an ordered index. Two backends share
//! the [`OrderedIndex`] contract: an in-memory [`BTree`] (cataloged by
//! [`MemoryDatabase`]) and a file-backed [`PagedBTree`] (cataloged by
//! [`Database`]). Filtered selects and deletes take prefix predicates such as
//! `and(greater(age, 18), less(age, 65))`.

pub mod art;
pub mod config;
pub mod executor;
pub mod planner;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::StoreConfig;
pub use executor::table::{MemoryTable, PersistentTable, Table};
pub use storage::{
    btree::BTree,
    database::Database,
    index::{BTreeMapIndex, OrderedIndex},
    memory::MemoryDatabase,
    paged_btree::PagedBTree,
    schema::{Column, Columns},
};
pub use types::{
    error::{DatabaseError, Result},
    row::{Key, Record, Row},
    value::{Value, ValueType},
};
