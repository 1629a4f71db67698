pub mod config_store;
pub mod instruction;
pub mod runtime_engine;
pub mod scripted;
