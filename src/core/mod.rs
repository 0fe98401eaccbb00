//! Core types for the lazyweld library.
//!
//! This module contains the stream channel, its producer plumbing, the
//! configuration shared by every stage and the error types.

pub mod config;
pub mod error;
pub mod stream;

// Re-export core items
pub use config::{Scope, StreamConfig};
pub use error::{Error, Result};
pub use stream::{Stream, StreamHandle};
