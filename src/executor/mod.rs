pub mod delete;
pub mod filter;
pub mod insert;
pub mod scan;
pub mod table;
