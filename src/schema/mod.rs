//! Schema module - Configuration types for SVM encoding.

mod config;
mod manifest;

pub use config::*;
pub use manifest::*;
