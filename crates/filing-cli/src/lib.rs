//! CLI library components for the filing graph transformer.

pub mod config;
pub mod logging;
pub mod pipeline;
