// src/data/mod.rs
pub mod frame;
pub mod loader;
pub mod matrix;
pub mod validation;

pub use frame::{Column, Frame, Value};
pub use loader::{read_csv, LabeledFrame};
pub use matrix::FeatureMatrix;
