//! Core types for doc-insight
//!
//! This crate provides the conversation data model, configuration,
//! error types, and logging setup used by the other doc-insight crates.

pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;

pub use conversation::{Conversation, Turn};
pub use error::{Error, Result};
