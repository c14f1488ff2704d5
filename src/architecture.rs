//! Architecture configuration
//!
//! Builds the exported KAN layers by name from JSON architecture files, so
//! models can be described without code changes.

use crate::error::{Error, Result};
use crate::layers::{
    ConvKAN, ConvOptions, FastConvKAN, FastKANOptions, KANLinear, KANLinearOptions, Layer,
    EXPORTED,
};
use crate::utils::SimpleRng;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Configuration for a single layer.
///
/// `layer_type` is one of the exported names (matched case-insensitively):
///
/// - **KANLinear**: requires `input_size` and `output_size`, optional `kan`
/// - **ConvKAN**: requires `in_channels` and `out_channels`, optional `conv` and `kan`
/// - **FastConvKAN**: requires `in_channels` and `out_channels`, optional `conv` and `fastkan`
///
/// # Examples
///
/// ```json
/// {
///   "layer_type": "ConvKAN",
///   "in_channels": 3,
///   "out_channels": 16,
///   "conv": { "kernel_size": 3, "padding": "same" },
///   "kan": { "grid_size": 8 }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    pub layer_type: String,

    // KANLinear
    pub input_size: Option<usize>,
    pub output_size: Option<usize>,

    // ConvKAN / FastConvKAN
    pub in_channels: Option<usize>,
    pub out_channels: Option<usize>,
    #[serde(default)]
    pub conv: ConvOptions,

    #[serde(default)]
    pub kan: KANLinearOptions,
    #[serde(default)]
    pub fastkan: FastKANOptions,
}

/// Ordered sequence of layers.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Linear,
    Conv,
    FastConv,
}

fn resolve_kind(layer_type: &str) -> Option<Kind> {
    let name = EXPORTED
        .iter()
        .find(|name| name.eq_ignore_ascii_case(layer_type))?;
    match *name {
        "KANLinear" => Some(Kind::Linear),
        "ConvKAN" => Some(Kind::Conv),
        "FastConvKAN" => Some(Kind::FastConv),
        _ => None,
    }
}

fn require(
    value: Option<usize>,
    index: usize,
    layer: &LayerConfig,
    field: &str,
) -> Result<usize> {
    value.ok_or_else(|| {
        Error::InvalidArchitecture(format!(
            "Layer {index}: {} layer missing {field}",
            layer.layer_type
        ))
    })
}

/// Kind and (input, output) sizes of a layer, after checking required fields.
fn layer_sizes(layer: &LayerConfig, index: usize) -> Result<(Kind, usize, usize)> {
    let kind = resolve_kind(&layer.layer_type).ok_or_else(|| {
        Error::InvalidArchitecture(format!(
            "Layer {index}: invalid layer type '{}'. Must be one of: {}",
            layer.layer_type,
            EXPORTED.join(", ")
        ))
    })?;

    let sizes = match kind {
        Kind::Linear => (
            require(layer.input_size, index, layer, "input_size")?,
            require(layer.output_size, index, layer, "output_size")?,
        ),
        Kind::Conv | Kind::FastConv => (
            require(layer.in_channels, index, layer, "in_channels")?,
            require(layer.out_channels, index, layer, "out_channels")?,
        ),
    };
    Ok((kind, sizes.0, sizes.1))
}

/// Check required fields and that consecutive layers of the same family connect.
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.layers.is_empty() {
        return Err(Error::InvalidArchitecture(
            "architecture must contain at least one layer".into(),
        ));
    }

    let mut previous: Option<(Kind, usize)> = None;
    for (index, layer) in config.layers.iter().enumerate() {
        let (kind, input, output) = layer_sizes(layer, index)?;
        if let Some((prev_kind, prev_output)) = previous {
            let linear_pair = prev_kind == Kind::Linear && kind == Kind::Linear;
            let conv_pair = prev_kind != Kind::Linear && kind != Kind::Linear;
            if (linear_pair || conv_pair) && prev_output != input {
                return Err(Error::InvalidArchitecture(format!(
                    "Layer {index}: input {input} does not match previous output {prev_output}"
                )));
            }
        }
        previous = Some((kind, output));
    }
    Ok(())
}

/// Parse and validate an architecture from a JSON string.
pub fn parse_architecture(contents: &str) -> Result<ArchitectureConfig> {
    let config: ArchitectureConfig = serde_json::from_str(contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Load an architecture configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use kan_tune::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/convkan_small.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    parse_architecture(&contents)
}

/// Construct every layer of `config` in order.
pub fn build_model(
    config: &ArchitectureConfig,
    rng: &mut SimpleRng,
) -> Result<Vec<Box<dyn Layer>>> {
    validate_architecture(config)?;

    let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(config.layers.len());
    for (index, layer) in config.layers.iter().enumerate() {
        let (kind, input, output) = layer_sizes(layer, index)?;
        let built: Box<dyn Layer> = match kind {
            Kind::Linear => Box::new(KANLinear::new(input, output, layer.kan.clone(), rng)?),
            Kind::Conv => Box::new(ConvKAN::new(
                input,
                output,
                layer.conv.clone(),
                layer.kan.clone(),
                rng,
            )?),
            Kind::FastConv => Box::new(FastConvKAN::new(
                input,
                output,
                layer.conv.clone(),
                layer.fastkan.clone(),
                rng,
            )?),
        };
        tracing::debug!(
            index,
            layer_type = built.layer_type(),
            parameters = built.parameter_count(),
            "built layer"
        );
        layers.push(built);
    }
    Ok(layers)
}
