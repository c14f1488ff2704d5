//! KANLinear layer
//!
//! A Kolmogorov-Arnold linear layer: every input/output pair carries a
//! learnable B-spline on a shared knot grid plus a residual base weight.
//! This module owns the layer's parameter layout and initialization.

use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::utils::{buffer_len, uniform_noise, xavier_uniform, SimpleRng};
use serde::Deserialize;

/// Hyperparameters of a [`KANLinear`] layer.
///
/// Every field has a default, so a JSON object may set any subset of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KANLinearOptions {
    /// Number of grid intervals on `grid_range`.
    pub grid_size: usize,
    /// Degree of the B-spline basis.
    pub spline_order: usize,
    pub scale_noise: f32,
    pub scale_base: f32,
    pub scale_spline: f32,
    /// Keep a separate per-edge scale for the spline term.
    pub enable_standalone_scale_spline: bool,
    pub grid_eps: f32,
    pub grid_range: [f32; 2],
}

impl Default for KANLinearOptions {
    fn default() -> Self {
        Self {
            grid_size: 5,
            spline_order: 3,
            scale_noise: 0.1,
            scale_base: 1.0,
            scale_spline: 1.0,
            enable_standalone_scale_spline: true,
            grid_eps: 0.02,
            grid_range: [-1.0, 1.0],
        }
    }
}

impl KANLinearOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(Error::InvalidLayer("grid_size must be positive".into()));
        }
        if !(self.grid_range[0] < self.grid_range[1]) {
            return Err(Error::InvalidLayer(format!(
                "grid_range must be increasing, got [{}, {}]",
                self.grid_range[0], self.grid_range[1]
            )));
        }
        if !(0.0..=1.0).contains(&self.grid_eps) {
            return Err(Error::InvalidLayer("grid_eps must be in [0, 1]".into()));
        }
        if self.scale_noise < 0.0 {
            return Err(Error::InvalidLayer("scale_noise must be non-negative".into()));
        }
        if self.checked_knots_per_input().is_none() {
            return Err(Error::InvalidLayer(format!(
                "grid_size {} with spline_order {} overflows the knot count",
                self.grid_size, self.spline_order
            )));
        }
        Ok(())
    }

    fn checked_knots_per_input(&self) -> Option<usize> {
        self.spline_order
            .checked_mul(2)?
            .checked_add(self.grid_size)?
            .checked_add(1)
    }

    /// Knots per input feature.
    pub fn knots_per_input(&self) -> usize {
        self.checked_knots_per_input().unwrap_or(usize::MAX)
    }

    /// Spline coefficients per input/output edge.
    pub fn coefficients_per_edge(&self) -> usize {
        self.grid_size.saturating_add(self.spline_order)
    }
}

/// Kolmogorov-Arnold linear layer.
///
/// Parameters are stored row-major:
///
/// * `grid` - knot vectors (input_size × knots_per_input), not trainable
/// * `base_weight` - residual weights (output_size × input_size)
/// * `spline_weight` - spline coefficients (output_size × input_size × coefficients_per_edge)
/// * `spline_scaler` - per-edge spline scale (output_size × input_size), when enabled
pub struct KANLinear {
    input_size: usize,
    output_size: usize,
    options: KANLinearOptions,
    grid: Vec<f32>,
    base_weight: Vec<f32>,
    spline_weight: Vec<f32>,
    spline_scaler: Option<Vec<f32>>,
}

impl KANLinear {
    /// Create a layer with a uniform knot grid and randomly initialized weights.
    ///
    /// The knot grid spans `grid_range` in `grid_size` intervals and is
    /// extended by `spline_order` knots on each side. Base weights use Xavier
    /// initialization scaled by `scale_base`; spline coefficients are uniform
    /// noise of magnitude `scale_noise / grid_size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayer`] for zero-sized layers, invalid options,
    /// or parameter buffers too large to allocate.
    pub fn new(
        input_size: usize,
        output_size: usize,
        options: KANLinearOptions,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(Error::InvalidLayer(format!(
                "KANLinear needs non-zero sizes, got {input_size} -> {output_size}"
            )));
        }
        options.validate()?;

        let too_large = || {
            Error::InvalidLayer(format!(
                "KANLinear {input_size} -> {output_size} has too many parameters"
            ))
        };
        let edges = buffer_len(&[output_size, input_size]).ok_or_else(too_large)?;
        let spline_len =
            buffer_len(&[edges, options.coefficients_per_edge()]).ok_or_else(too_large)?;
        buffer_len(&[input_size, options.knots_per_input()]).ok_or_else(too_large)?;

        let [low, high] = options.grid_range;
        let h = (high - low) / options.grid_size as f32;
        let order = options.spline_order as f32;
        let knots: Vec<f32> = (0..options.knots_per_input())
            .map(|i| low + (i as f32 - order) * h)
            .collect();
        let grid = knots.repeat(input_size);

        let mut base_weight = xavier_uniform(rng, input_size, output_size, edges);
        for w in &mut base_weight {
            *w *= options.scale_base;
        }

        let noise_scale = options.scale_noise / options.grid_size as f32;
        let mut spline_weight = uniform_noise(rng, noise_scale, spline_len);
        let spline_scaler = if options.enable_standalone_scale_spline {
            Some(vec![options.scale_spline; edges])
        } else {
            // Without a standalone scaler the scale is folded into the coefficients.
            for c in &mut spline_weight {
                *c *= options.scale_spline;
            }
            None
        };

        Ok(Self {
            input_size,
            output_size,
            options,
            grid,
            base_weight,
            spline_weight,
            spline_scaler,
        })
    }

    pub fn options(&self) -> &KANLinearOptions {
        &self.options
    }

    /// Knot vector of input feature `index`.
    pub fn knots(&self, index: usize) -> Option<&[f32]> {
        let per_input = self.options.knots_per_input();
        let start = index.checked_mul(per_input)?;
        let end = start.checked_add(per_input)?;
        self.grid.get(start..end)
    }

    pub fn base_weight(&self) -> &[f32] {
        &self.base_weight
    }

    pub fn spline_weight(&self) -> &[f32] {
        &self.spline_weight
    }

    pub fn spline_scaler(&self) -> Option<&[f32]> {
        self.spline_scaler.as_deref()
    }
}

impl Layer for KANLinear {
    fn layer_type(&self) -> &'static str {
        "KANLinear"
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn parameter_count(&self) -> usize {
        self.base_weight.len()
            + self.spline_weight.len()
            + self.spline_scaler.as_ref().map_or(0, Vec::len)
    }
}
