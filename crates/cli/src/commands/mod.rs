//! CLI command implementations

pub mod node;
