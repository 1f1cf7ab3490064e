// src/encoding/mod.rs
pub mod encoder;
pub mod reconcile;

pub use encoder::{EncodedFrame, EncoderConfig, FeatureEncoder};
