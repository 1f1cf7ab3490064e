// src/lib.rs
pub mod cli;
pub mod config;
pub mod data;
pub mod encoding;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod utils;

pub use error::{PipelineError, Result};
