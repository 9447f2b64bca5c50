pub mod hash;
pub mod mock;
