pub mod compiler;
pub mod error;
pub mod expression;
pub mod frame;
pub mod tokenizer;
