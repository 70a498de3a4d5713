pub mod adapter;
pub mod error;
pub mod sink;
pub mod source;
pub mod sql;
