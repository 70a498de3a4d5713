pub mod copier;
pub mod counter;
pub mod error;
pub mod executor;
pub mod factory;
pub mod orchestrator;

#[cfg(test)]
mod tests;
