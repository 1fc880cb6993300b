use voxalign_core::image::{Image, ImageGeometry};
use voxalign_core::interpolation::LinearInterpolator;
use voxalign_core::spatial::{Direction3, Point3, Spacing3};
use voxalign_core::transform::{AffineParameters, AffineTransform, AFFINE_PARAMETER_COUNT};
use voxalign_registration::metric::{MeanSquaresMetric, Metric, SamplingStrategy};

fn gaussian(geometry: ImageGeometry, center: Point3, sigma: f64) -> Image {
    let g = geometry.clone();
    Image::from_fn(geometry, move |index| {
        let d = g.voxel_to_physical(index) - center;
        (-d.norm_squared() / (2.0 * sigma * sigma)).exp() as f32
    })
}

fn images() -> (Image, Image) {
    let fixed_geometry = ImageGeometry::new(
        [12, 12, 12],
        Point3::new(4.0, 4.0, 4.0),
        Spacing3::repeat(1.0),
        Direction3::identity(),
    )
    .unwrap();
    let fixed = gaussian(fixed_geometry, Point3::new(9.5, 9.5, 9.5), 3.0);
    let moving = gaussian(ImageGeometry::from_size([20, 20, 20]), Point3::new(10.5, 9.0, 10.0), 3.0);
    (fixed, moving)
}

fn perturbed_parameters() -> AffineParameters {
    AffineParameters::from_column_slice(&[
        1.02, 0.03, -0.01, -0.02, 0.98, 0.04, 0.01, -0.03, 1.01, 0.3, -0.2, 0.1,
    ])
}

#[test]
fn test_translation_lowers_cost() {
    let (fixed, moving) = images();
    let metric = MeanSquaresMetric::new();
    let interpolator = LinearInterpolator::new();
    let center = Point3::new(9.5, 9.5, 9.5);

    let identity = AffineTransform::identity(center);
    let before = metric.evaluate(&fixed, &moving, &identity, &interpolator).unwrap();

    let mut parameters = identity.parameters();
    parameters[9] = 1.0;
    parameters[10] = -0.5;
    parameters[11] = 0.5;
    let aligned = AffineTransform::from_parameters(&parameters, center);
    let after = metric.evaluate(&fixed, &moving, &aligned, &interpolator).unwrap();

    assert!(after.value < before.value * 0.1, "{} vs {}", after.value, before.value);
    // The translation derivative points away from the true offset.
    assert!(before.derivative[9] < 0.0);
    assert!(before.derivative[10] > 0.0);
    assert!(before.derivative[11] < 0.0);
}

#[test]
fn test_gradient_matches_finite_difference() {
    let (fixed, moving) = images();
    let metric = MeanSquaresMetric::new();
    let interpolator = LinearInterpolator::new();
    let center = Point3::new(9.5, 9.5, 9.5);
    let parameters = perturbed_parameters();

    let analytic = metric
        .evaluate(&fixed, &moving, &AffineTransform::from_parameters(&parameters, center), &interpolator)
        .unwrap();
    assert_eq!(analytic.number_of_valid_samples, fixed.number_of_voxels());

    let h = 1e-6;
    for k in 0..AFFINE_PARAMETER_COUNT {
        let mut plus = parameters;
        plus[k] += h;
        let mut minus = parameters;
        minus[k] -= h;
        let value_plus = metric
            .evaluate(&fixed, &moving, &AffineTransform::from_parameters(&plus, center), &interpolator)
            .unwrap()
            .value;
        let value_minus = metric
            .evaluate(&fixed, &moving, &AffineTransform::from_parameters(&minus, center), &interpolator)
            .unwrap()
            .value;
        let numeric = (value_plus - value_minus) / (2.0 * h);
        let tolerance = 1e-2 * analytic.derivative.norm() + 1e-9;
        assert!(
            (numeric - analytic.derivative[k]).abs() < tolerance,
            "parameter {}: numeric {} analytic {}",
            k,
            numeric,
            analytic.derivative[k]
        );
    }
}

#[test]
fn test_bitwise_identical_across_thread_pools() {
    let (fixed, moving) = images();
    let transform = AffineTransform::from_parameters(&perturbed_parameters(), Point3::new(9.5, 9.5, 9.5));
    let interpolator = LinearInterpolator::new();
    // Spans several sample chunks.
    let big_fixed = gaussian(ImageGeometry::from_size([24, 24, 24]), Point3::new(11.0, 10.0, 12.0), 4.0);

    let evaluate = |threads: usize, fixed: &Image| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| MeanSquaresMetric::new().evaluate(fixed, &moving, &transform, &interpolator).unwrap())
    };

    for image in [&fixed, &big_fixed] {
        let single = evaluate(1, image);
        let quad = evaluate(4, image);
        let many = evaluate(7, image);
        assert_eq!(single.value.to_bits(), quad.value.to_bits());
        assert_eq!(single.value.to_bits(), many.value.to_bits());
        for k in 0..AFFINE_PARAMETER_COUNT {
            assert_eq!(single.derivative[k].to_bits(), quad.derivative[k].to_bits());
            assert_eq!(single.derivative[k].to_bits(), many.derivative[k].to_bits());
        }
        assert_eq!(single.number_of_valid_samples, quad.number_of_valid_samples);
    }
}

#[test]
fn test_subsampled_metric_uses_fewer_samples() {
    let (fixed, moving) = images();
    let transform = AffineTransform::identity(Point3::new(9.5, 9.5, 9.5));
    let value = MeanSquaresMetric::new()
        .with_sampling(SamplingStrategy::Regular { step: 2 })
        .evaluate(&fixed, &moving, &transform, &LinearInterpolator::new())
        .unwrap();
    assert_eq!(value.number_of_valid_samples, 12 * 12 * 12 / 2);
    assert!(value.value > 0.0);
}
