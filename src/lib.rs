pub mod adapter;
pub mod cli;
pub mod config;
pub mod engine;
pub mod state;
