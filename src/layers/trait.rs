//! Layer trait shared by the KAN layer types
//!
//! The trait describes what model-definition code needs to wire layers
//! together: the layer's registered name, its input/output feature counts and
//! how many trainable parameters it holds.

/// Common interface for the exported KAN layers.
///
/// # Example
///
/// ```
/// use kan_tune::layers::{KANLinear, KANLinearOptions, Layer};
/// use kan_tune::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = KANLinear::new(4, 2, KANLinearOptions::default(), &mut rng).unwrap();
/// let boxed: Box<dyn Layer> = Box::new(layer);
/// assert_eq!(boxed.layer_type(), "KANLinear");
/// assert_eq!(boxed.output_size(), 2);
/// ```
pub trait Layer {
    /// Name the layer is exported under.
    fn layer_type(&self) -> &'static str;

    /// Input features per sample.
    ///
    /// Convolutional layers report their channel count.
    fn input_size(&self) -> usize;

    /// Output features per sample (output channels for convolutions).
    fn output_size(&self) -> usize;

    /// Total count of trainable scalars.
    fn parameter_count(&self) -> usize;
}
