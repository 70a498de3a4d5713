
mod orchestrator;
