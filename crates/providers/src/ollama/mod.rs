pub mod client;
pub mod config;
pub mod stream;

pub use client::OllamaClient;
pub use config::OllamaConfig;
