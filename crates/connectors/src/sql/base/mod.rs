pub mod encoder;
pub mod error;
pub mod row;
