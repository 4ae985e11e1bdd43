//! Property-based tests for evaluation, interpolation and uniform sampling.

use proptest::prelude::*;
use spline_eval::{KnotsMode, NurbsSpline, PolySpline, Spline, SplineExt};
use spline_math::{dvec3, Point3};

fn points_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Point3>> {
    prop::collection::vec(
        (-10.0..10.0f64, -10.0..10.0f64, -10.0..10.0f64).prop_map(|(x, y, z)| dvec3(x, y, z)),
        min..max,
    )
}

fn knots_mode_strategy() -> impl Strategy<Value = KnotsMode> {
    prop_oneof![
        Just(KnotsMode::Normal),
        Just(KnotsMode::EndPoint),
        Just(KnotsMode::Bezier),
    ]
}

fn poly(points: &[Point3], cyclic: bool) -> PolySpline {
    let mut spline = PolySpline::new();
    for &p in points {
        spline.add_point(p, 1.0, 0.0);
    }
    spline.set_cyclic(cyclic);
    spline
}

/// Arc length at an evaluated-domain index factor.
fn arc_length_at(lengths: &[f64], index_factor: f64) -> f64 {
    let index = index_factor.floor() as usize;
    if index >= lengths.len() {
        return lengths[lengths.len() - 1];
    }
    let previous = if index == 0 { 0.0 } else { lengths[index - 1] };
    previous + (lengths[index] - previous) * (index_factor - index as f64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Uniform samples are spaced by an equal arc length.
    #[test]
    fn prop_uniform_samples_equal_spacing(
        points in points_strategy(2, 10),
        cyclic in any::<bool>(),
        count in 2usize..40,
    ) {
        prop_assume!(points.windows(2).all(|w| w[0].distance(w[1]) > 1e-3));
        let spline = poly(&points, cyclic);
        let lengths = spline.evaluated_lengths();
        let samples = spline.sample_uniform_index_factors(count).unwrap();
        prop_assert_eq!(samples.len(), count);

        let divisions = if cyclic { count } else { count - 1 };
        let spacing = spline.length() / divisions as f64;
        for pair in samples.windows(2) {
            prop_assert!(pair[0] <= pair[1], "samples out of order: {:?}", samples);
            let step = arc_length_at(lengths, pair[1]) - arc_length_at(lengths, pair[0]);
            prop_assert!((step - spacing).abs() <= spacing * 0.01 + 1e-9,
                "step {step} differs from spacing {spacing}");
        }
    }

    /// A poly spline's evaluated data is its control data.
    #[test]
    fn prop_poly_interpolation_is_identity(
        points in points_strategy(1, 12),
        cyclic in any::<bool>(),
    ) {
        let spline = poly(&points, cyclic);
        prop_assert_eq!(spline.evaluated_points_size(), points.len());
        let evaluated = spline.interpolate_to_evaluated_typed(&points);
        prop_assert_eq!(evaluated, points);
    }

    /// With unit weights, the NURBS basis values at every evaluated point sum to one.
    #[test]
    fn prop_nurbs_partition_of_unity(
        order in 2usize..6,
        extra_points in 0usize..7,
        mode in knots_mode_strategy(),
        cyclic in any::<bool>(),
        resolution in 1usize..8,
    ) {
        let mut spline = NurbsSpline::new();
        for i in 0..order + extra_points {
            spline.add_point(dvec3(i as f64, (i % 3) as f64, 0.0), 1.0, 0.0, 1.0);
        }
        spline.set_order(order).unwrap();
        spline.set_resolution(resolution).unwrap();
        spline.set_knots_mode(mode);
        spline.set_cyclic(cyclic);

        let basis = spline.basis_cache();
        prop_assert_eq!(basis.len(), spline.evaluated_points_size());
        for window in basis {
            prop_assert_eq!(window.weights.len(), order);
            let sum: f64 = window.weights.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "basis sums to {sum}");
            prop_assert!(window.weights.iter().all(|&w| w >= -1e-12));
        }
    }

    /// Minimum-twist normals are unit length and perpendicular to the tangents.
    #[test]
    fn prop_normals_are_perpendicular(
        points in points_strategy(3, 12),
        cyclic in any::<bool>(),
    ) {
        let spline = poly(&points, cyclic);
        let tangents = spline.evaluated_tangents();
        prop_assume!(tangents.iter().all(|t| (t.length() - 1.0).abs() < 1e-9));
        prop_assume!(tangents[0].x.abs() + tangents[0].y.abs() > 1e-2);

        for (normal, tangent) in spline.evaluated_normals().iter().zip(tangents) {
            prop_assert!((normal.length() - 1.0).abs() < 1e-6);
            prop_assert!(normal.dot(*tangent).abs() < 1e-6);
        }
    }
}
