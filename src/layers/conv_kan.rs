//! ConvKAN layer
//!
//! A 2D convolution whose per-patch transform is a [`KANLinear`] instead of a
//! dense kernel. Each group owns one KANLinear mapping its flattened
//! `in_channels/groups × kernel_size²` patch to `out_channels/groups` outputs.

use crate::error::{Error, Result};
use crate::layers::{KANLinear, KANLinearOptions, Layer};
use crate::utils::SimpleRng;
use serde::Deserialize;

/// Spatial padding of a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Symmetric padding of the given size on every side.
    Explicit(usize),
    /// No padding.
    Valid,
    /// Pad so the output has the input's spatial size (stride 1 only).
    Same,
}

impl Default for Padding {
    fn default() -> Self {
        Padding::Explicit(0)
    }
}

/// Values used for padded positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    #[default]
    Zeros,
    Reflect,
    Replicate,
    Circular,
}

/// Geometry shared by the convolutional KAN layers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvOptions {
    /// Square kernel side.
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: Padding,
    pub dilation: usize,
    pub groups: usize,
    pub padding_mode: PaddingMode,
}

impl Default for ConvOptions {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            stride: 1,
            padding: Padding::default(),
            dilation: 1,
            groups: 1,
            padding_mode: PaddingMode::default(),
        }
    }
}

impl ConvOptions {
    /// Check the geometry against the channel counts and return the
    /// per-group patch length.
    pub(crate) fn validate(&self, in_channels: usize, out_channels: usize) -> Result<usize> {
        if in_channels == 0 || out_channels == 0 {
            return Err(Error::InvalidLayer("channel counts must be positive".into()));
        }
        if self.kernel_size == 0 || self.stride == 0 || self.dilation == 0 {
            return Err(Error::InvalidLayer(
                "kernel_size, stride and dilation must be positive".into(),
            ));
        }
        if self.groups == 0 {
            return Err(Error::InvalidLayer("groups must be positive".into()));
        }
        if in_channels % self.groups != 0 || out_channels % self.groups != 0 {
            return Err(Error::InvalidLayer(format!(
                "channels ({in_channels} in, {out_channels} out) must be divisible by groups ({})",
                self.groups
            )));
        }
        if self.padding == Padding::Same && self.stride != 1 {
            return Err(Error::InvalidLayer(
                "'same' padding requires stride 1".into(),
            ));
        }
        if self.span().is_none() {
            return Err(Error::InvalidLayer(format!(
                "dilated kernel extent overflows (kernel_size {}, dilation {})",
                self.kernel_size, self.dilation
            )));
        }
        self.patch_size(in_channels).ok_or_else(|| {
            Error::InvalidLayer(format!(
                "patch of {in_channels} channels with kernel_size {} overflows",
                self.kernel_size
            ))
        })
    }

    /// Flattened patch length seen by each group.
    ///
    /// `None` when `groups` is zero or the length overflows `usize`.
    pub fn patch_size(&self, in_channels: usize) -> Option<usize> {
        in_channels
            .checked_div(self.groups)?
            .checked_mul(self.kernel_size)?
            .checked_mul(self.kernel_size)
    }

    /// Extent of the dilated kernel, `dilation·(kernel_size-1) + 1`.
    fn span(&self) -> Option<usize> {
        self.dilation
            .checked_mul(self.kernel_size.checked_sub(1)?)?
            .checked_add(1)
    }

    /// Effective padding on each side as (before, after).
    ///
    /// `Same` splits an odd total so the extra row/column goes after.
    pub fn padding_amounts(&self) -> (usize, usize) {
        match self.padding {
            Padding::Explicit(p) => (p, p),
            Padding::Valid => (0, 0),
            Padding::Same => {
                let total = self
                    .dilation
                    .saturating_mul(self.kernel_size.saturating_sub(1));
                (total / 2, total - total / 2)
            }
        }
    }

    /// Output length along one spatial axis of length `input`.
    ///
    /// `(input + pad_before + pad_after - dilation·(kernel_size-1) - 1) / stride + 1`,
    /// or `None` when the kernel does not fit or the geometry is degenerate.
    pub fn output_len(&self, input: usize) -> Option<usize> {
        let (before, after) = self.padding_amounts();
        let span = self.span()?;
        let padded = input.checked_add(before)?.checked_add(after)?;
        let free = padded.checked_sub(span)?;
        Some(free.checked_div(self.stride)? + 1)
    }
}

/// Convolution with a KANLinear transform per group.
///
/// # Example
///
/// ```
/// use kan_tune::layers::{ConvKAN, ConvOptions, KANLinearOptions, Layer, Padding};
/// use kan_tune::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let conv = ConvOptions { padding: Padding::Same, ..ConvOptions::default() };
/// let layer = ConvKAN::new(3, 8, conv, KANLinearOptions::default(), &mut rng).unwrap();
/// assert_eq!(layer.output_shape(32, 32), Some((32, 32)));
/// assert_eq!(layer.out_channels(), 8);
/// ```
pub struct ConvKAN {
    in_channels: usize,
    out_channels: usize,
    conv: ConvOptions,
    kernels: Vec<KANLinear>,
}

impl ConvKAN {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        conv: ConvOptions,
        kan: KANLinearOptions,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        let patch = conv.validate(in_channels, out_channels)?;
        let group_out = out_channels / conv.groups;
        let kernels = (0..conv.groups)
            .map(|_| KANLinear::new(patch, group_out, kan.clone(), rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            in_channels,
            out_channels,
            conv,
            kernels,
        })
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn conv_options(&self) -> &ConvOptions {
        &self.conv
    }

    /// Per-group KANLinear transforms.
    pub fn kernels(&self) -> &[KANLinear] {
        &self.kernels
    }

    /// Output (height, width) for an input of `height × width`.
    pub fn output_shape(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        Some((self.conv.output_len(height)?, self.conv.output_len(width)?))
    }
}

impl Layer for ConvKAN {
    fn layer_type(&self) -> &'static str {
        "ConvKAN"
    }

    fn input_size(&self) -> usize {
        self.in_channels
    }

    fn output_size(&self) -> usize {
        self.out_channels
    }

    fn parameter_count(&self) -> usize {
        self.kernels.iter().map(Layer::parameter_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv_kan_initialization() {
        let mut rng = SimpleRng::new(42);
        let layer = ConvKAN::new(
            1,
            8,
            ConvOptions::default(),
            KANLinearOptions::default(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(layer.in_channels(), 1);
        assert_eq!(layer.out_channels(), 8);
        assert_eq!(layer.kernels().len(), 1);
        assert_eq!(layer.kernels()[0].input_size(), 9); // 1 × 3 × 3
        assert_eq!(layer.kernels()[0].output_size(), 8);
    }

    #[test]
    fn test_conv_kan_parameter_count() {
        let mut rng = SimpleRng::new(42);
        let layer = ConvKAN::new(
            1,
            8,
            ConvOptions::default(),
            KANLinearOptions::default(),
            &mut rng,
        )
        .unwrap();

        // 72 edges: base 72 + spline 72·8 + scaler 72
        assert_eq!(layer.parameter_count(), 72 + 576 + 72);
    }

    #[test]
    fn test_grouped_kernels() {
        let mut rng = SimpleRng::new(42);
        let conv = ConvOptions {
            groups: 2,
            ..ConvOptions::default()
        };
        let layer = ConvKAN::new(4, 6, conv, KANLinearOptions::default(), &mut rng).unwrap();

        assert_eq!(layer.kernels().len(), 2);
        for kernel in layer.kernels() {
            assert_eq!(kernel.input_size(), 2 * 9);
            assert_eq!(kernel.output_size(), 3);
        }
    }

    #[test]
    fn test_output_dimensions_no_padding() {
        let mut rng = SimpleRng::new(42);
        let layer = ConvKAN::new(
            1,
            8,
            ConvOptions::default(),
            KANLinearOptions::default(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(layer.output_shape(28, 28), Some((26, 26)));
    }

    #[test]
    fn test_output_dimensions_stride_dilation() {
        let conv = ConvOptions {
            stride: 2,
            dilation: 2,
            padding: Padding::Explicit(1),
            ..ConvOptions::default()
        };
        // (32 + 2 - 2·2 - 1) / 2 + 1 = 15
        assert_eq!(conv.output_len(32), Some(15));
        assert_eq!(conv.output_len(2), None);
    }

    #[test]
    fn test_same_padding_even_kernel() {
        let conv = ConvOptions {
            kernel_size: 4,
            padding: Padding::Same,
            ..ConvOptions::default()
        };
        assert_eq!(conv.padding_amounts(), (1, 2));
        assert_eq!(conv.output_len(10), Some(10));
    }

    #[test]
    fn test_rejects_invalid_groups() {
        let mut rng = SimpleRng::new(42);
        for groups in [0, 3] {
            let conv = ConvOptions {
                groups,
                ..ConvOptions::default()
            };
            assert!(ConvKAN::new(4, 8, conv, KANLinearOptions::default(), &mut rng).is_err());
        }
    }

    #[test]
    fn test_same_padding_requires_unit_stride() {
        let mut rng = SimpleRng::new(42);
        let conv = ConvOptions {
            padding: Padding::Same,
            stride: 2,
            ..ConvOptions::default()
        };
        assert!(ConvKAN::new(1, 1, conv, KANLinearOptions::default(), &mut rng).is_err());
    }

    #[test]
    fn test_degenerate_geometry_has_no_output() {
        let zero_kernel = ConvOptions {
            kernel_size: 0,
            ..ConvOptions::default()
        };
        assert_eq!(zero_kernel.output_len(5), None);

        let zero_kernel_same = ConvOptions {
            padding: Padding::Same,
            ..zero_kernel
        };
        assert_eq!(zero_kernel_same.padding_amounts(), (0, 0));
        assert_eq!(zero_kernel_same.output_len(5), None);

        let zero_stride = ConvOptions {
            stride: 0,
            ..ConvOptions::default()
        };
        assert_eq!(zero_stride.output_len(5), None);

        let zero_groups = ConvOptions {
            groups: 0,
            ..ConvOptions::default()
        };
        assert_eq!(zero_groups.patch_size(4), None);
    }

    #[test]
    fn test_rejects_overflowing_kernel() {
        let mut rng = SimpleRng::new(42);
        let huge = ConvOptions {
            kernel_size: usize::MAX / 2,
            ..ConvOptions::default()
        };
        assert_eq!(huge.patch_size(3), None);
        assert!(matches!(
            ConvKAN::new(3, 8, huge, KANLinearOptions::default(), &mut rng),
            Err(Error::InvalidLayer(_))
        ));

        let wide = ConvOptions {
            kernel_size: 3,
            dilation: usize::MAX,
            ..ConvOptions::default()
        };
        assert_eq!(wide.output_len(32), None);
        assert!(ConvKAN::new(1, 1, wide, KANLinearOptions::default(), &mut rng).is_err());
    }
}
