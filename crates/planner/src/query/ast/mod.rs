pub mod common;
pub mod copy;
pub mod create_table;
pub mod expr;
pub mod insert;
pub mod select;
