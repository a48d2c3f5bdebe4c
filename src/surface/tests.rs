use super::*;
use crate::observe::{CollectingObserver, NullObserver};
use std::sync::Arc;

fn couple(shape: DistributionShape, g0: f64, a: f64, z: u32) -> RedoxComponent {
    RedoxComponent {
        shape,
        g0,
        e0: -0.2,
        sigma_e0: 0.04,
        log_k0: 1.2,
        sigma_log_k0: 0.1,
        a,
        z,
    }
}

fn build(components: &[RedoxComponent]) -> SurfaceDistribution {
    SurfaceDistribution::build_with(20, (-0.5, 0.1), 15, (0.0, 2.5), components, DEFAULT_SUPERSAMPLE, &NullObserver)
        .expect("surface should build")
}

fn relative_gap(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs()
}

#[test]
fn grids_are_potential_by_log_rate() {
    let surface = build(&[couple(DistributionShape::Normal, 1e-10, 0.5, 1)]);
    assert_eq!(surface.groups.len(), 1);
    let group = &surface.groups[0];
    assert_eq!(group.loading.dim(), (20, 15));
    assert_eq!(group.symmetry.dim(), (20, 15));
    assert_eq!(group.electrons.dim(), (20, 15));
    assert_eq!(group.mean_symmetry(), 0.5);
    assert_eq!(group.mean_electrons(), 1.0);

    let e_grid = surface.potential_grid();
    let k_grid = surface.log_rate_grid();
    assert_eq!(e_grid[[3, 0]], surface.e_axis[3]);
    assert_eq!(e_grid[[3, 14]], surface.e_axis[3]);
    assert_eq!(k_grid[[0, 7]], surface.log_k_axis[7]);
    assert_eq!(k_grid[[19, 7]], surface.log_k_axis[7]);
}

#[test]
fn compression_without_cutoff_keeps_all_loading() {
    let surface = build(&[
        couple(DistributionShape::Normal, 3.5e-11, 0.5, 1),
        couple(DistributionShape::Lorentz, 2.0e-11, 0.5, 2),
    ]);
    let compressed = surface.compress_observed(0.0, &NullObserver).unwrap();
    assert_eq!(compressed.len(), 2 * 20 * 15);
    assert!(relative_gap(compressed.total_loading(), surface.total_loading()) < 1e-6);
    compressed.validate().unwrap();
}

#[test]
fn equal_kinetics_merge_into_one_group() {
    let g1 = 3.5e-11;
    let g2 = 2.0e-11;
    let merged = build(&[
        couple(DistributionShape::Normal, g1, 0.5, 1),
        couple(DistributionShape::Normal, g2, 0.5, 1),
    ]);
    assert_eq!(merged.groups.len(), 1);

    let first = build(&[couple(DistributionShape::Normal, g1, 0.5, 1)]);
    let second = build(&[couple(DistributionShape::Normal, g2, 0.5, 1)]);
    let separate = first.total_loading() + second.total_loading();
    assert!(relative_gap(merged.total_loading(), separate) < 1e-12);
    // chunked quadrature loses a little mass at the chunk seams
    assert!(relative_gap(merged.total_loading(), g1 + g2) < 1e-2);
}

#[test]
fn merge_only_looks_at_the_previous_group() {
    let surface = build(&[
        couple(DistributionShape::Normal, 1e-11, 0.5, 1),
        couple(DistributionShape::Normal, 1e-11, 0.3, 1),
        couple(DistributionShape::Normal, 1e-11, 0.5, 1),
        couple(DistributionShape::Normal, 1e-11, 0.5, 2),
    ]);
    assert_eq!(surface.groups.len(), 4);
    assert!((surface.groups[1].mean_symmetry() - 0.3).abs() < 1e-12);
    assert_eq!(surface.groups[3].mean_electrons(), 2.0);
}

#[test]
fn rate_constants_are_linear() {
    let surface = build(&[couple(DistributionShape::Normal, 1e-10, 0.5, 1)]);
    let compressed = surface.compress_observed(0.0, &NullObserver).unwrap();
    for (index, k0) in compressed.k0.iter().enumerate() {
        let log_k = surface.log_k_axis[index % surface.log_k_axis.len()];
        let e0 = surface.e_axis[index / surface.log_k_axis.len()];
        assert!(relative_gap(*k0, 10f64.powf(log_k)) < 1e-12);
        assert_eq!(compressed.e0[index], e0);
    }
}

#[test]
fn cutoff_drops_small_sites_and_reports_metrics() {
    let surface = build(&[couple(DistributionShape::Normal, 1e-10, 0.5, 1)]);
    let observer = CollectingObserver::new();
    let cutoff = 1e-13;
    let compressed = surface.compress_observed(cutoff, &observer).unwrap();

    assert!(compressed.len() < 300);
    assert!(compressed.g.iter().all(|g| *g >= cutoff));
    let expected_reduction = 100.0 * (1.0 - compressed.len() as f64 / 300.0);
    assert_eq!(observer.metric("matrix_size_reduction_pct"), Some(expected_reduction));
    let loss = observer.metric("loading_loss_pct").unwrap();
    assert!(loss > 0.0 && loss < 5.0);
    assert_eq!(observer.metric("loading_passed_mol_cm2"), Some(compressed.total_loading()));
}

#[test]
fn cutoff_equal_to_loading_is_kept() {
    let surface = build(&[couple(DistributionShape::Normal, 1e-10, 0.5, 1)]);
    let largest = surface.groups[0].loading.iter().cloned().fold(f64::MIN, f64::max);
    let compressed = surface.compress_observed(largest, &NullObserver).unwrap();
    assert!(compressed.g.contains(&largest));
    assert!(compressed.g.iter().all(|g| *g >= largest));
}

#[test]
fn lorentz_has_heavier_tails_than_normal() {
    let normal = build(&[couple(DistributionShape::Normal, 1e-10, 0.5, 1)]);
    let lorentz = build(&[couple(DistributionShape::Lorentz, 1e-10, 0.5, 1)]);
    let edge_normal = normal.groups[0].loading[[19, 7]];
    let edge_lorentz = lorentz.groups[0].loading[[19, 7]];
    assert!(edge_lorentz > edge_normal * 1e3);
}

#[test]
fn unknown_shape_is_rejected() {
    let config = ComponentConfig {
        dist_type: "gaussian-ish".into(),
        g0: 1e-10,
        e0: 0.0,
        sigma_e0: 0.05,
        log_k0: 1.0,
        sigma_log_k0: 0.1,
        a: 0.5,
        z: 1,
    };
    let err = config.to_component(3).unwrap_err();
    assert!(matches!(err, SimError::InvalidDistribution { component: 3, .. }));
    assert_eq!(DistributionShape::parse("Cauchy", 0).unwrap(), DistributionShape::Lorentz);
}

#[test]
fn invalid_component_values_are_rejected() {
    let mut bad = couple(DistributionShape::Normal, 1e-10, 1.0, 1);
    assert!(matches!(
        SurfaceDistribution::build_with(10, (-0.5, 0.1), 10, (0.0, 2.0), &[bad.clone()], 11, &NullObserver),
        Err(SimError::InvalidDistribution { component: 0, .. })
    ));
    bad.a = 0.5;
    bad.sigma_e0 = 0.0;
    assert!(SurfaceDistribution::build_with(10, (-0.5, 0.1), 10, (0.0, 2.0), &[bad], 11, &NullObserver).is_err());
}

#[test]
fn swapped_bounds_are_reordered_with_a_warning() {
    let observer = CollectingObserver::new();
    let components = [couple(DistributionShape::Normal, 1e-10, 0.5, 1)];
    let swapped =
        SurfaceDistribution::build_with(20, (0.1, -0.5), 15, (2.5, 0.0), &components, DEFAULT_SUPERSAMPLE, &observer)
            .unwrap();
    let ordered = build(&components);
    assert!(swapped.bounds_reordered);
    assert!(!ordered.bounds_reordered);
    assert_eq!(swapped.e_axis, ordered.e_axis);
    assert_eq!(swapped.log_k_axis, ordered.log_k_axis);
    assert_eq!(observer.count(Severity::Warning), 1);
}

#[test]
fn degenerate_axes_are_invalid_bounds() {
    let components = [couple(DistributionShape::Normal, 1e-10, 0.5, 1)];
    for (e_res, e_bounds, k_res) in [(1, (-0.5, 0.1), 10), (0, (-0.5, 0.1), 10), (10, (0.2, 0.2), 10), (10, (-0.5, 0.1), 1)] {
        let result = SurfaceDistribution::build_with(e_res, e_bounds, k_res, (0.0, 2.0), &components, 11, &NullObserver);
        assert!(matches!(result, Err(SimError::InvalidBounds(_))));
    }
}

#[test]
fn mismatched_arrays_fail_validation() {
    let err = CompressedSurface::from_arrays(vec![0.0; 3], vec![1.0; 3], vec![1e-12; 3], vec![0.5; 2], vec![1.0; 3])
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::ArraySizeMismatch {
            array: "a",
            expected: 3,
            actual: 2
        }
    ));
}

#[test]
fn active_layer_exposes_compressed_arrays() {
    let definition = LayerDefinition {
        e_axis_resolution: 20,
        e_bounds: (-0.5, 0.1),
        log_k_axis_resolution: 15,
        log_k_bounds: (0.0, 2.5),
        components: vec![couple(DistributionShape::Lorentz, 3.5e-11, 0.5, 1)],
    };
    let observer = Arc::new(CollectingObserver::new());
    let layer = ActiveLayer::with_observer(&definition, 1e-14, observer.clone()).unwrap();
    assert_eq!(layer.e_axis().len(), 20);
    assert_eq!(layer.log_k_axis().len(), 15);
    assert_eq!(layer.groups().len(), 1);
    assert_eq!(layer.loading_cutoff(), 1e-14);
    assert_eq!(layer.total_loading(), layer.compressed().total_loading());
    assert!(observer.metric("loading_passed_mol_cm2").is_some());
    assert!(matches!(ActiveLayer::new(&definition, -1.0), Err(SimError::InvalidParameter(_))));
}
