//! Signal database and DBC parser
//!
//! This module contains the DBC catalogue parser and the unified, read-only
//! signal database the generator works from.

pub mod dbc;
pub mod database;

// Re-export key types for convenience
pub use database::{
    DatabaseStats, MessageDefinition, SignalDatabase, SignalDefinition, ValueType,
};
