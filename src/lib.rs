pub mod config;
pub mod error;
pub mod protocol;
pub mod scoring;
pub mod state;
pub mod types;
pub mod verses;
pub mod ws;
