// Slash commands
pub mod config;
pub mod help;
pub mod setup;
pub mod whitelist;
