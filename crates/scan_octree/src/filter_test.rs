use glam::DVec3;

use super::*;
use crate::test_utils::random_cloud;

/// 10x10x10 lattice with spacing 0.1 starting at the origin.
fn lattice() -> Vec<DVec3> {
  let mut points = Vec::with_capacity(1_000);
  for x in 0..10 {
    for y in 0..10 {
      for z in 0..10 {
        points.push(DVec3::new(x as f64, y as f64, z as f64) * 0.1);
      }
    }
  }
  points
}

fn lattice_with_stray() -> (Vec<DVec3>, usize) {
  let mut points = lattice();
  points.insert(500, DVec3::splat(10.0));
  (points, 500)
}

// =========================================================================
// Radius outlier removal
// =========================================================================

/// Lattice corners see themselves plus six neighbors within 0.15; the stray
/// point only sees itself.
#[test]
fn test_radius_removal_drops_isolated_point() {
  let (points, stray) = lattice_with_stray();
  let removal = radius_outlier_removal(&points, 4, 0.15, OctreeConfig::default()).unwrap();

  assert_eq!(removal.outlier_indices, vec![stray]);
  assert_eq!(removal.inliers, lattice());
}

#[test]
fn test_radius_removal_counts_the_point_itself() {
  let (points, _) = lattice_with_stray();
  let removal = radius_outlier_removal(&points, 1, 0.01, OctreeConfig::default()).unwrap();

  assert!(removal.outlier_indices.is_empty());
  assert_eq!(removal.inliers, points);
}

#[test]
fn test_radius_removal_rejects_non_finite_points() {
  let points = vec![DVec3::ZERO, DVec3::new(f64::NAN, 0.0, 0.0), DVec3::new(0.01, 0.0, 0.0)];
  let removal = radius_outlier_removal(&points, 0, 1.0, OctreeConfig::default()).unwrap();

  assert_eq!(removal.outlier_indices, vec![1]);
  assert_eq!(removal.inliers.len(), 2);
}

#[test]
fn test_radius_removal_rejects_bad_radius() {
  let points = random_cloud(71, 10);
  for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
    let result = radius_outlier_removal(&points, 2, radius, OctreeConfig::default());
    assert!(
      matches!(result, Err(OctreeError::InvalidParameter { name: "radius", .. })),
      "radius {radius}"
    );
  }
}

#[test]
fn test_radius_removal_empty_input() {
  let removal = radius_outlier_removal(&[], 3, 0.5, OctreeConfig::default()).unwrap();
  assert_eq!(removal, OutlierRemoval::default());
}

// =========================================================================
// Statistical outlier removal
// =========================================================================

#[test]
fn test_statistical_removal_drops_far_point() {
  let (points, stray) = lattice_with_stray();
  let removal = statistical_outlier_removal(&points, 6, 2.0, OctreeConfig::default()).unwrap();

  assert_eq!(removal.outlier_indices, vec![stray]);
  assert_eq!(removal.inliers, lattice());
}

/// Two points have identical neighbor distances, so neither stands out.
#[test]
fn test_statistical_removal_keeps_uniform_pair() {
  let points = [DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0)];
  let removal = statistical_outlier_removal(&points, 3, 1.0, OctreeConfig::default()).unwrap();

  assert!(removal.outlier_indices.is_empty());
  assert_eq!(removal.inliers, points.to_vec());
}

#[test]
fn test_statistical_removal_small_clouds() {
  let single = [DVec3::splat(0.5)];
  let removal = statistical_outlier_removal(&single, 4, 1.0, OctreeConfig::default()).unwrap();
  assert_eq!(removal.inliers, single.to_vec());

  let removal = statistical_outlier_removal(&[], 4, 1.0, OctreeConfig::default()).unwrap();
  assert_eq!(removal, OutlierRemoval::default());
}

#[test]
fn test_statistical_removal_rejects_non_finite_points() {
  let mut points = lattice();
  points.push(DVec3::splat(f64::INFINITY));
  let removal = statistical_outlier_removal(&points, 6, 5.0, OctreeConfig::default()).unwrap();

  assert_eq!(removal.outlier_indices, vec![1_000]);
}

#[test]
fn test_statistical_removal_rejects_bad_parameters() {
  let points = random_cloud(72, 10);

  let result = statistical_outlier_removal(&points, 0, 1.0, OctreeConfig::default());
  assert!(matches!(result, Err(OctreeError::InvalidParameter { name: "neighbors", .. })));

  for std_ratio in [0.0, -2.0, f64::NAN] {
    let result = statistical_outlier_removal(&points, 4, std_ratio, OctreeConfig::default());
    assert!(
      matches!(result, Err(OctreeError::InvalidParameter { name: "std_ratio", .. })),
      "std_ratio {std_ratio}"
    );
  }
}

// =========================================================================
// Voxel down-sampling
// =========================================================================

#[test]
fn test_voxel_down_sample_merges_shared_voxel() {
  let points = [
    DVec3::splat(0.1),
    DVec3::splat(5.0),
    DVec3::splat(0.2),
  ];
  let sampled = voxel_down_sample(&points, 1.0).unwrap();

  assert_eq!(sampled.len(), 2);
  assert!(sampled[0].abs_diff_eq(DVec3::splat(0.15), 1e-12), "got {:?}", sampled[0]);
  assert_eq!(sampled[1], DVec3::splat(5.0));
}

#[test]
fn test_voxel_down_sample_fine_grid_keeps_every_point() {
  let points = lattice();
  let sampled = voxel_down_sample(&points, 0.01).unwrap();
  assert_eq!(sampled, points);
}

#[test]
fn test_voxel_down_sample_reduces_dense_cloud() {
  let points = random_cloud(73, 10_000);
  let sampled = voxel_down_sample(&points, 0.25).unwrap();

  assert!(sampled.len() <= 125, "got {} voxels", sampled.len());
  let bounds = Aabb3::from_points(&points).unwrap();
  assert!(sampled.iter().all(|p| bounds.contains_point(*p)));
}

/// Far-apart points on a fine grid stay in separate voxels, and a grid too
/// fine to index is rejected instead of merging voxels.
#[test]
fn test_voxel_down_sample_grid_index_range() {
  let far = [DVec3::ZERO, DVec3::new(1e6, 0.0, 0.0)];
  assert_eq!(voxel_down_sample(&far, 1e-3).unwrap(), far.to_vec());

  let huge = [
    DVec3::ZERO,
    DVec3::new(1e30, 0.0, 0.0),
    DVec3::new(2e30, 0.0, 0.0),
  ];
  assert!(matches!(
    voxel_down_sample(&huge, 1e-3),
    Err(OctreeError::InvalidParameter { name: "voxel_size", .. })
  ));

  let unbounded = [DVec3::splat(-1e308), DVec3::splat(1e308)];
  assert!(voxel_down_sample(&unbounded, 1.0).is_err());
}

#[test]
fn test_voxel_down_sample_edge_cases() {
  assert!(voxel_down_sample(&[], 0.5).unwrap().is_empty());
  assert!(voxel_down_sample(&[DVec3::splat(f64::NAN)], 0.5).unwrap().is_empty());

  for voxel_size in [0.0, -0.5, f64::NAN] {
    assert!(
      matches!(
        voxel_down_sample(&[DVec3::ZERO], voxel_size),
        Err(OctreeError::InvalidParameter { name: "voxel_size", .. })
      ),
      "voxel_size {voxel_size}"
    );
  }
}
