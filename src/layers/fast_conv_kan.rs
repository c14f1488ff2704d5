//! FastConvKAN layer
//!
//! Same convolution geometry as [`crate::layers::ConvKAN`], but each group's
//! patch transform is a FastKAN block (Gaussian RBF basis with a layer norm
//! in front) rather than a B-spline KANLinear.

use crate::error::Result;
use crate::layers::conv_kan::ConvOptions;
use crate::layers::fastkan::{FastKANLayer, FastKANOptions};
use crate::layers::Layer;
use crate::utils::SimpleRng;

/// Convolution with a FastKAN transform per group.
pub struct FastConvKAN {
    in_channels: usize,
    out_channels: usize,
    conv: ConvOptions,
    options: FastKANOptions,
    blocks: Vec<FastKANLayer>,
}

impl FastConvKAN {
    /// Create the layer, one FastKAN block per group.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidLayer`] when the geometry or the RBF
    /// grid is invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use kan_tune::layers::{ConvOptions, FastConvKAN, FastKANOptions, Layer};
    /// use kan_tune::utils::SimpleRng;
    ///
    /// let mut rng = SimpleRng::new(42);
    /// let layer = FastConvKAN::new(3, 16, ConvOptions::default(), FastKANOptions::default(), &mut rng)
    ///     .unwrap();
    /// assert_eq!(layer.output_shape(28, 28), Some((26, 26)));
    /// ```
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        conv: ConvOptions,
        options: FastKANOptions,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        let patch = conv.validate(in_channels, out_channels)?;
        let group_out = out_channels / conv.groups;
        let blocks = (0..conv.groups)
            .map(|_| FastKANLayer::new(patch, group_out, &options, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            in_channels,
            out_channels,
            conv,
            options,
            blocks,
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

    pub fn options(&self) -> &FastKANOptions {
        &self.options
    }

    pub fn groups(&self) -> usize {
        self.blocks.len()
    }

    /// Input and output width of every group's block.
    pub fn group_dims(&self) -> (usize, usize) {
        self.blocks
            .first()
            .map_or((0, 0), |block| (block.input_dim(), block.output_dim()))
    }

    /// RBF centres and their shared width, identical across groups.
    pub fn rbf_grid(&self) -> (&[f32], f32) {
        self.blocks
            .first()
            .map_or((&[][..], 0.0), |block| (block.centres(), block.denominator()))
    }

    pub fn output_shape(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        Some((self.conv.output_len(height)?, self.conv.output_len(width)?))
    }
}

impl Layer for FastConvKAN {
    fn layer_type(&self) -> &'static str {
        "FastConvKAN"
    }

    fn input_size(&self) -> usize {
        self.in_channels
    }

    fn output_size(&self) -> usize {
        self.out_channels
    }

    fn parameter_count(&self) -> usize {
        self.blocks.iter().map(FastKANLayer::parameter_count).sum()
    }
}
