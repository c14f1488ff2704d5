//! KAN layer surface
//!
//! Exposes the three Kolmogorov-Arnold layer types model-definition code can
//! construct, [`KANLinear`], [`ConvKAN`] and [`FastConvKAN`], along with their
//! option structs. The FastKAN block used inside [`FastConvKAN`] stays private.

mod conv_kan;
mod fast_conv_kan;
mod fastkan;
mod kan_linear;
mod r#trait;

pub use conv_kan::{ConvKAN, ConvOptions, Padding, PaddingMode};
pub use fast_conv_kan::FastConvKAN;
pub use fastkan::FastKANOptions;
pub use kan_linear::{KANLinear, KANLinearOptions};
pub use r#trait::Layer;

/// Names of the exported layer types.
pub const EXPORTED: [&str; 3] = ["KANLinear", "ConvKAN", "FastConvKAN"];
