//! Tests for the public KAN layer surface
//!
//! This file tests:
//! - The exported layer names
//! - KANLinear: creation, knot grid, parameter counts
//! - ConvKAN / FastConvKAN: geometry and grouping

use approx::assert_relative_eq;
use kan_tune::layers::{
    ConvKAN, ConvOptions, FastConvKAN, FastKANOptions, KANLinear, KANLinearOptions, Layer,
    Padding, EXPORTED,
};
use kan_tune::utils::SimpleRng;

// ============================================================================
// Surface Tests
// ============================================================================

mod surface_tests {
    use super::*;

    #[test]
    fn test_exactly_three_exports() {
        assert_eq!(EXPORTED, ["KANLinear", "ConvKAN", "FastConvKAN"]);
        assert!(!EXPORTED.contains(&"FastKANLayer"));
    }

    #[test]
    fn test_construction_order_does_not_matter() {
        let mut rng = SimpleRng::new(3);
        let fast = FastConvKAN::new(1, 2, ConvOptions::default(), FastKANOptions::default(), &mut rng)
            .unwrap();
        let linear = KANLinear::new(3, 3, KANLinearOptions::default(), &mut rng).unwrap();
        let conv = ConvKAN::new(2, 2, ConvOptions::default(), KANLinearOptions::default(), &mut rng)
            .unwrap();

        let mut names = vec![fast.layer_type(), linear.layer_type(), conv.layer_type()];
        names.sort_unstable();
        let mut expected = EXPORTED.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }
}

// ============================================================================
// KANLinear Tests
// ============================================================================

mod kan_linear_tests {
    use super::*;

    #[test]
    fn test_kan_linear_parameter_count() {
        let mut rng = SimpleRng::new(42);
        let layer = KANLinear::new(784, 64, KANLinearOptions::default(), &mut rng).unwrap();

        let edges = 784 * 64;
        assert_eq!(layer.parameter_count(), edges + edges * 8 + edges);
    }

    #[test]
    fn test_custom_grid_range() {
        let mut rng = SimpleRng::new(42);
        let options = KANLinearOptions {
            grid_size: 4,
            spline_order: 1,
            grid_range: [0.0, 2.0],
            ..KANLinearOptions::default()
        };
        let layer = KANLinear::new(1, 1, options, &mut rng).unwrap();
        let knots = layer.knots(0).unwrap();

        assert_eq!(knots.len(), 4 + 2 + 1);
        assert_relative_eq!(knots[0], -0.5, epsilon = 1e-6);
        assert_relative_eq!(knots[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(knots[6], 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_scale_base_applied() {
        let options = KANLinearOptions {
            scale_base: 0.0,
            ..KANLinearOptions::default()
        };
        let layer = KANLinear::new(8, 8, options, &mut SimpleRng::new(5)).unwrap();
        assert!(layer.base_weight().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_spline_scaler_filled() {
        let options = KANLinearOptions {
            scale_spline: 0.25,
            ..KANLinearOptions::default()
        };
        let layer = KANLinear::new(3, 2, options, &mut SimpleRng::new(5)).unwrap();
        let scaler = layer.spline_scaler().unwrap();

        assert_eq!(scaler.len(), 6);
        for &s in scaler {
            assert_relative_eq!(s, 0.25);
        }
    }

    #[test]
    fn test_rejects_invalid_options() {
        let mut rng = SimpleRng::new(42);
        let reversed = KANLinearOptions {
            grid_range: [1.0, -1.0],
            ..KANLinearOptions::default()
        };
        assert!(KANLinear::new(2, 2, reversed, &mut rng).is_err());
        assert!(KANLinear::new(0, 2, KANLinearOptions::default(), &mut rng).is_err());
    }
}

// ============================================================================
// Convolution Tests
// ============================================================================

mod conv_tests {
    use super::*;

    #[test]
    fn test_conv_kan_same_padding_shape() {
        let mut rng = SimpleRng::new(42);
        let conv = ConvOptions {
            kernel_size: 5,
            padding: Padding::Same,
            ..ConvOptions::default()
        };
        let layer = ConvKAN::new(3, 6, conv, KANLinearOptions::default(), &mut rng).unwrap();

        assert_eq!(layer.output_shape(17, 9), Some((17, 9)));
        assert_eq!(layer.kernels()[0].input_size(), 75);
    }

    #[test]
    fn test_fast_conv_kan_strided_shape() {
        let mut rng = SimpleRng::new(42);
        let conv = ConvOptions {
            stride: 2,
            padding: Padding::Explicit(1),
            ..ConvOptions::default()
        };
        let layer = FastConvKAN::new(4, 4, conv, FastKANOptions::default(), &mut rng).unwrap();

        // (28 + 2 - 3) / 2 + 1 = 14
        assert_eq!(layer.output_shape(28, 28), Some((14, 14)));
        assert_eq!(layer.input_size(), 4);
        assert_eq!(layer.output_size(), 4);
    }

    #[test]
    fn test_fast_conv_kan_rbf_width() {
        let mut rng = SimpleRng::new(42);
        let options = FastKANOptions {
            grid_min: -1.0,
            grid_max: 1.0,
            num_grids: 5,
            ..FastKANOptions::default()
        };
        let layer = FastConvKAN::new(1, 1, ConvOptions::default(), options, &mut rng).unwrap();
        let (centres, width) = layer.rbf_grid();

        assert_relative_eq!(width, 0.5);
        assert_relative_eq!(centres[2], 0.0);
    }

    #[test]
    fn test_kernel_larger_than_input() {
        let mut rng = SimpleRng::new(42);
        let conv = ConvOptions {
            kernel_size: 7,
            ..ConvOptions::default()
        };
        let layer = ConvKAN::new(1, 1, conv, KANLinearOptions::default(), &mut rng).unwrap();
        assert_eq!(layer.output_shape(5, 5), None);
    }
}
