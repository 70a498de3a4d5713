pub mod error;
pub mod metrics;
pub mod progress;
pub mod state;
pub mod watermark;
