// Utility functions module
pub mod config;
pub mod formatters;
pub mod steam_id;
pub mod template;
