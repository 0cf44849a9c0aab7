//! Point-cloud cleanup built on the octree queries: radius and statistical
//! outlier removal, and voxel-grid down-sampling.

use std::collections::HashMap;

use glam::DVec3;
use rayon::prelude::*;

use crate::bounds::Aabb3;
use crate::config::OctreeConfig;
use crate::error::{OctreeError, OctreeResult};
use crate::octree::PointOctree;

/// Result of an outlier filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutlierRemoval {
  /// Points that passed, in input order.
  pub inliers: Vec<DVec3>,
  /// Input indices of the rejected points, ascending.
  pub outlier_indices: Vec<usize>,
}

impl OutlierRemoval {
  fn from_flags(points: &[DVec3], keep: &[bool]) -> Self {
    let mut removal = Self::default();
    for (index, (point, keep)) in points.iter().zip(keep).enumerate() {
      if *keep {
        removal.inliers.push(*point);
      } else {
        removal.outlier_indices.push(index);
      }
    }
    removal
  }
}

/// Drop points with fewer than `min_neighbors` points within `radius`.
///
/// The neighbor count includes the point itself, so `min_neighbors == 1`
/// keeps every finite point. Non-finite points are always outliers.
///
/// # Errors
/// [`OctreeError::InvalidParameter`] unless `radius` is finite and positive,
/// or if `config` is invalid.
#[cfg_attr(feature = "spans", tracing::instrument(skip(points, config), name = "filter::radius_outliers"))]
pub fn radius_outlier_removal(
  points: &[DVec3],
  min_neighbors: usize,
  radius: f64,
  config: OctreeConfig,
) -> OctreeResult<OutlierRemoval> {
  if !radius.is_finite() || radius <= 0.0 {
    return Err(OctreeError::invalid_parameter(
      "radius",
      format!("must be finite and positive, got {radius}"),
    ));
  }
  let tree = PointOctree::build_parallel(points, config)?;

  let keep: Vec<bool> = points
    .par_iter()
    .map(|p| p.is_finite() && tree.count_in_radius(*p, radius) >= min_neighbors)
    .collect();

  let removal = OutlierRemoval::from_flags(points, &keep);
  tracing::debug!(
    points = points.len(),
    outliers = removal.outlier_indices.len(),
    radius,
    min_neighbors,
    "radius outlier removal"
  );
  Ok(removal)
}

/// Drop points whose mean distance to their `neighbors` nearest other points
/// exceeds `mean + std_ratio * std` over the whole cloud.
///
/// `std` is the sample standard deviation of the per-point means. Points
/// with fewer than `neighbors` other points available average over what
/// exists; a cloud with fewer than two finite points is kept as is.
/// Non-finite points are always outliers and do not enter the statistics.
///
/// # Errors
/// [`OctreeError::InvalidParameter`] if `neighbors` is 0, if `std_ratio` is
/// not finite and positive, or if `config` is invalid.
#[cfg_attr(feature = "spans", tracing::instrument(skip(points, config), name = "filter::statistical_outliers"))]
pub fn statistical_outlier_removal(
  points: &[DVec3],
  neighbors: usize,
  std_ratio: f64,
  config: OctreeConfig,
) -> OctreeResult<OutlierRemoval> {
  if neighbors == 0 {
    return Err(OctreeError::invalid_parameter("neighbors", "must be at least 1, got 0"));
  }
  if !std_ratio.is_finite() || std_ratio <= 0.0 {
    return Err(OctreeError::invalid_parameter(
      "std_ratio",
      format!("must be finite and positive, got {std_ratio}"),
    ));
  }
  let tree = PointOctree::build_parallel(points, config)?;

  // The closest hit of a stored point is the point itself, so ask for one more.
  let mean_distances: Vec<Option<f64>> = points
    .par_iter()
    .map(|p| {
      if !p.is_finite() {
        return None;
      }
      let found = tree.find_k_nearest(*p, neighbors + 1);
      let others = found.get(1..).unwrap_or_default();
      if others.is_empty() {
        Some(0.0)
      } else {
        Some(others.iter().map(|n| n.distance).sum::<f64>() / others.len() as f64)
      }
    })
    .collect();

  let valid: Vec<f64> = mean_distances.iter().flatten().copied().collect();
  let keep: Vec<bool> = if valid.len() < 2 {
    mean_distances.iter().map(Option::is_some).collect()
  } else {
    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let std = (valid.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / (n - 1.0)).sqrt();
    let threshold = mean + std_ratio * std;
    tracing::trace!(mean, std, threshold, "neighbor distance statistics");
    mean_distances
      .iter()
      .map(|d| d.is_some_and(|d| d <= threshold))
      .collect()
  };

  let removal = OutlierRemoval::from_flags(points, &keep);
  tracing::debug!(
    points = points.len(),
    outliers = removal.outlier_indices.len(),
    neighbors,
    std_ratio,
    "statistical outlier removal"
  );
  Ok(removal)
}

/// Integer coordinates of a voxel in the down-sampling grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VoxelKey {
  x: i64,
  y: i64,
  z: i64,
}

impl VoxelKey {
  fn of(point: DVec3, origin: DVec3, voxel_size: f64) -> Self {
    let cell = ((point - origin) / voxel_size).floor();
    Self {
      x: cell.x as i64,
      y: cell.y as i64,
      z: cell.z as i64,
    }
  }
}

/// Replace the points of each occupied voxel by their centroid.
///
/// The grid is anchored half a voxel below the cloud's minimum corner.
/// Output order follows the first point seen in each voxel. Non-finite
/// points are skipped.
///
/// # Errors
/// [`OctreeError::InvalidParameter`] unless `voxel_size` is finite and
/// positive, or if the grid over the cloud would need more cells per axis
/// than an `i64` can index.
pub fn voxel_down_sample(points: &[DVec3], voxel_size: f64) -> OctreeResult<Vec<DVec3>> {
  if !voxel_size.is_finite() || voxel_size <= 0.0 {
    return Err(OctreeError::invalid_parameter(
      "voxel_size",
      format!("must be finite and positive, got {voxel_size}"),
    ));
  }
  let Some(bounds) = Aabb3::from_points(points) else {
    return Ok(Vec::new());
  };
  let cells = bounds.extent().max_element() / voxel_size + 1.0;
  if cells >= i64::MAX as f64 {
    return Err(OctreeError::invalid_parameter(
      "voxel_size",
      format!("{voxel_size} is too small for a cloud spanning {}", bounds.extent().max_element()),
    ));
  }
  let origin = bounds.min - DVec3::splat(voxel_size * 0.5);

  let mut slots: HashMap<VoxelKey, usize> = HashMap::new();
  let mut sums: Vec<(DVec3, u32)> = Vec::new();
  for point in points.iter().copied().filter(|p| p.is_finite()) {
    let slot = *slots
      .entry(VoxelKey::of(point, origin, voxel_size))
      .or_insert_with(|| {
        sums.push((DVec3::ZERO, 0));
        sums.len() - 1
      });
    let (sum, count) = &mut sums[slot];
    *sum += point;
    *count += 1;
  }

  let centroids: Vec<DVec3> = sums
    .into_iter()
    .map(|(sum, count)| sum / f64::from(count))
    .collect();
  tracing::debug!(
    points = points.len(),
    voxels = centroids.len(),
    voxel_size,
    "voxel down-sample"
  );
  Ok(centroids)
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;
