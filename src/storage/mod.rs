// Persistence
pub mod config_store;
