pub mod btree;
pub mod database;
pub mod descriptor;
pub mod index;
pub mod memory;
pub mod paged_btree;
pub mod pager;
pub mod schema;
pub mod snapshot;
