pub mod config;
pub mod data;
pub mod error;
pub mod mutate;
pub mod render;
pub mod server;
pub mod store;
pub mod types;
pub mod workflow;
