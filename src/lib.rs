//! KAN layers and training callbacks
//!
//! This crate provides the Kolmogorov-Arnold layer surface used by model
//! definitions and the training-loop callbacks, including the optional Ray
//! Tune metrics integration.
//!
//! # Modules
//!
//! - `layers`: `KANLinear`, `ConvKAN` and `FastConvKAN`
//! - `architecture`: building those layers from JSON configuration
//! - `callbacks`: lifecycle hooks and the Ray Tune integration
//! - `settings`: the key/value settings store integrations are gated on
//! - `utils`: deterministic parameter initialization

pub mod architecture;
pub mod callbacks;
pub mod error;
pub mod layers;
pub mod settings;
pub mod utils;

pub use error::{Error, Result};
