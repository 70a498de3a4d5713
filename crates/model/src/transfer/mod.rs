pub mod batch;
pub mod key;
pub mod request;
pub mod summary;
pub mod watermark;
