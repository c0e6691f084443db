use molswarm::scoring::DesirabilityCurve;
use rstest::rstest;

fn size_curve() -> DesirabilityCurve {
    DesirabilityCurve::new(vec![
        (0.0, 0.0),
        (6.0, 0.6),
        (14.0, 1.0),
        (24.0, 0.4),
        (40.0, 0.0),
    ])
    .unwrap()
}

// --- INTERPOLATION TESTS ---
#[rstest]
#[case(0.0, 0.0)] // First control point
#[case(3.0, 0.3)] // Midway up the first segment
#[case(6.0, 0.6)] // Control point
#[case(10.0, 0.8)] // Midway 6 -> 14
#[case(14.0, 1.0)] // Peak
#[case(19.0, 0.7)] // Midway down 14 -> 24
#[case(32.0, 0.2)] // Midway down 24 -> 40
fn test_interpolated_values(#[case] x: f32, #[case] expected: f32) {
    let curve = size_curve();
    let got = curve.value(x);
    assert!(
        (got - expected).abs() < 1e-5,
        "desirability at {} was {}, expected {}",
        x,
        got,
        expected
    );
}

// --- CLAMP TESTS ---
#[rstest]
#[case(-2.0, 0.0)] // Below the covered range
#[case(40.0, 0.0)] // Last control point
#[case(55.0, 0.0)] // Above the covered range
#[case(f32::NEG_INFINITY, 0.0)]
#[case(f32::INFINITY, 0.0)]
fn test_clamped_values(#[case] x: f32, #[case] expected: f32) {
    let curve = size_curve();
    assert_eq!(curve.value(x), expected, "clamp failed for x = {}", x);
}

// --- VALIDATION TESTS ---
#[rstest]
#[case(vec![], false)] // Empty
#[case(vec![(0.0, 0.5)], false)] // Single point
#[case(vec![(0.0, 0.1), (0.0, 0.9)], false)] // Duplicate x
#[case(vec![(1.0, 0.1), (0.0, 0.9)], false)] // Decreasing x
#[case(vec![(0.0, 0.1), (1.0, 0.9)], true)] // Minimal valid curve
fn test_point_list_validation(#[case] points: Vec<(f32, f32)>, #[case] ok: bool) {
    assert_eq!(
        DesirabilityCurve::new(points.clone()).is_ok(),
        ok,
        "validation disagreed for {:?}",
        points
    );
}

#[rstest]
fn test_apply_maps_batches_elementwise() {
    let curve = size_curve();
    let out = curve.apply(&[3.0, 14.0, 55.0]);
    assert_eq!(out.len(), 3);
    assert!((out[0] - 0.3).abs() < 1e-5);
    assert!((out[1] - 1.0).abs() < 1e-5);
    assert_eq!(out[2], 0.0);
}
