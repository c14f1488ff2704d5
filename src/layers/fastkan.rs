//! FastKAN layer: Gaussian radial basis functions in place of B-splines.
//!
//! Used as the per-group building block of [`crate::layers::FastConvKAN`]; it
//! is deliberately not part of the public layer surface.

use crate::error::{Error, Result};
use crate::utils::{buffer_len, linspace, uniform_noise, xavier_uniform, SimpleRng};
use serde::Deserialize;

/// Hyperparameters of the FastKAN block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FastKANOptions {
    pub grid_min: f32,
    pub grid_max: f32,
    /// Number of RBF centres on [grid_min, grid_max].
    pub num_grids: usize,
    /// Add a SiLU-activated linear residual path.
    pub use_base_update: bool,
    pub spline_weight_init_scale: f32,
}

impl Default for FastKANOptions {
    fn default() -> Self {
        Self {
            grid_min: -2.0,
            grid_max: 2.0,
            num_grids: 8,
            use_base_update: true,
            spline_weight_init_scale: 0.1,
        }
    }
}

impl FastKANOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_grids < 2 {
            return Err(Error::InvalidLayer("num_grids must be at least 2".into()));
        }
        if !(self.grid_min < self.grid_max) {
            return Err(Error::InvalidLayer(format!(
                "grid_min ({}) must be below grid_max ({})",
                self.grid_min, self.grid_max
            )));
        }
        Ok(())
    }
}

pub(crate) struct FastKANLayer {
    input_dim: usize,
    output_dim: usize,
    norm_scale: Vec<f32>,
    norm_shift: Vec<f32>,
    centres: Vec<f32>,
    denominator: f32,
    spline_weight: Vec<f32>,
    base_weight: Option<Vec<f32>>,
    base_bias: Option<Vec<f32>>,
}

impl FastKANLayer {
    pub(crate) fn new(
        input_dim: usize,
        output_dim: usize,
        options: &FastKANOptions,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        if input_dim == 0 || output_dim == 0 {
            return Err(Error::InvalidLayer(format!(
                "FastKAN block needs non-zero sizes, got {input_dim} -> {output_dim}"
            )));
        }
        options.validate()?;
        let spline_len = buffer_len(&[output_dim, input_dim, options.num_grids]).ok_or_else(|| {
            Error::InvalidLayer(format!(
                "FastKAN block {input_dim} -> {output_dim} has too many parameters"
            ))
        })?;

        let centres = linspace(options.grid_min, options.grid_max, options.num_grids);
        let denominator = (options.grid_max - options.grid_min) / (options.num_grids - 1) as f32;
        let spline_weight = uniform_noise(rng, options.spline_weight_init_scale, spline_len);
        let (base_weight, base_bias) = if options.use_base_update {
            (
                Some(xavier_uniform(rng, input_dim, output_dim, output_dim * input_dim)),
                Some(vec![0.0f32; output_dim]),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            input_dim,
            output_dim,
            norm_scale: vec![1.0f32; input_dim],
            norm_shift: vec![0.0f32; input_dim],
            centres,
            denominator,
            spline_weight,
            base_weight,
            base_bias,
        })
    }

    pub(crate) fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub(crate) fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// RBF centres; a fixed buffer, not a parameter.
    pub(crate) fn centres(&self) -> &[f32] {
        &self.centres
    }

    pub(crate) fn denominator(&self) -> f32 {
        self.denominator
    }

    pub(crate) fn parameter_count(&self) -> usize {
        self.norm_scale.len()
            + self.norm_shift.len()
            + self.spline_weight.len()
            + self.base_weight.as_ref().map_or(0, Vec::len)
            + self.base_bias.as_ref().map_or(0, Vec::len)
    }
}
