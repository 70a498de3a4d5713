pub mod encoder;
pub mod params;
pub mod sink;
pub mod source;
pub mod utils;
