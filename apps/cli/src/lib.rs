//! Batch runner for the results pipeline.

pub mod config;
pub mod pipeline;
