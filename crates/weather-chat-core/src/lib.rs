//! Core types, config, and errors for Weather Chat.

pub mod config;
pub mod error;
pub mod types;
