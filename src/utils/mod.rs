// src/utils/mod.rs
pub mod log_utils;
pub mod utils;
