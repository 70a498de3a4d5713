pub mod params;
pub mod source;
