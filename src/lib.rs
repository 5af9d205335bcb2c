//! Fib - tag-level FLV editing
//!
//! Scans an FLV file into an editable rebase plan and builds a new file from
//! an edited plan, copying audio and video payloads verbatim.
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod error;
pub mod integrity;
pub mod plan;
pub mod rebase;

pub use error::{Error, Result};
