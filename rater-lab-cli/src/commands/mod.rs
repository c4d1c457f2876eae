//! CLI commands

pub mod extract;
pub mod validate;
