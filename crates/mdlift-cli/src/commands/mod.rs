pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod extract;
pub mod render;
pub mod upload;
