//! Cloud-to-cloud distance metrics for comparing two reconstructions.
//!
//! Every metric starts from the same per-point quantity: for each point of
//! one cloud, the distance to its nearest neighbor in the other cloud. Both
//! directions are computed once by [`CloudComparison::new`] and the Chamfer,
//! Hausdorff and similarity summaries are derived from them.

use glam::DVec3;
use rayon::prelude::*;

use crate::config::OctreeConfig;
use crate::error::{OctreeError, OctreeResult};
use crate::octree::PointOctree;

/// For each `source` point, the distance to its nearest point in `target`.
///
/// Distances are `f64::INFINITY` when `target` is empty. Runs in parallel
/// over `source`.
pub fn point_cloud_distance(source: &[DVec3], target: &PointOctree) -> Vec<f64> {
  source
    .par_iter()
    .map(|p| {
      target
        .find_nearest_entry(*p, f64::INFINITY)
        .map_or(f64::INFINITY, |n| n.distance)
    })
    .collect()
}

/// Mean, maximum and population standard deviation of one direction's
/// nearest-neighbor distances.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionalStats {
  /// Mean distance.
  pub mean: f64,
  /// Largest distance.
  pub max: f64,
  /// Population standard deviation.
  pub std: f64,
}

impl DirectionalStats {
  /// Summarize a set of distances (all zeros for an empty set).
  pub fn from_distances(distances: &[f64]) -> Self {
    if distances.is_empty() {
      return Self::default();
    }
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let variance = distances.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;
    let max = distances.iter().copied().fold(0.0, f64::max);
    Self {
      mean,
      max,
      std: variance.sqrt(),
    }
  }
}

/// Chamfer distance between clouds `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChamferStats {
  /// Average of the two directional means.
  pub chamfer_distance: f64,
  /// Distances from points of `a` to their nearest point in `b`.
  pub a_to_b: DirectionalStats,
  /// Distances from points of `b` to their nearest point in `a`.
  pub b_to_a: DirectionalStats,
}

/// Hausdorff distance between clouds `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HausdorffStats {
  /// Larger of the two directional maxima.
  pub hausdorff_distance: f64,
  /// Farthest point of `a` from `b`.
  pub max_a_to_b: f64,
  /// Farthest point of `b` from `a`.
  pub max_b_to_a: f64,
}

/// Share of points of each cloud lying close to the other cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityStats {
  /// See [`ChamferStats::chamfer_distance`].
  pub chamfer_distance: f64,
  /// See [`HausdorffStats::hausdorff_distance`].
  pub hausdorff_distance: f64,
  /// Distance under which a point counts as matched.
  pub threshold: f64,
  /// Percentage (0-100) of `a` within `threshold` of `b`.
  pub within_threshold_a_to_b: f64,
  /// Percentage (0-100) of `b` within `threshold` of `a`.
  pub within_threshold_b_to_a: f64,
  /// Mean of the two percentages.
  pub similarity_percentage: f64,
}

/// Nearest-neighbor distances in both directions between two clouds.
#[derive(Clone, Debug)]
pub struct CloudComparison {
  a_to_b: Vec<f64>,
  b_to_a: Vec<f64>,
}

impl CloudComparison {
  /// Index both clouds and compute per-point distances in both directions.
  ///
  /// Non-finite points are ignored.
  ///
  /// # Errors
  /// [`OctreeError::InvalidParameter`] if either cloud has no finite point,
  /// or if `config` is invalid.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "cloud::compare"))]
  pub fn new(a: &[DVec3], b: &[DVec3], config: OctreeConfig) -> OctreeResult<Self> {
    let a = finite_points(a, "a")?;
    let b = finite_points(b, "b")?;

    let tree_a = PointOctree::build_parallel(&a, config)?;
    let tree_b = PointOctree::build_parallel(&b, config)?;

    let comparison = Self {
      a_to_b: point_cloud_distance(&a, &tree_b),
      b_to_a: point_cloud_distance(&b, &tree_a),
    };
    tracing::debug!(
      points_a = a.len(),
      points_b = b.len(),
      chamfer = comparison.chamfer().chamfer_distance,
      "compared point clouds"
    );
    Ok(comparison)
  }

  /// Per-point distances from `a` to `b`, in the order of `a`'s finite points.
  pub fn a_to_b(&self) -> &[f64] {
    &self.a_to_b
  }

  /// Per-point distances from `b` to `a`, in the order of `b`'s finite points.
  pub fn b_to_a(&self) -> &[f64] {
    &self.b_to_a
  }

  /// Chamfer distance and directional summaries.
  pub fn chamfer(&self) -> ChamferStats {
    let a_to_b = DirectionalStats::from_distances(&self.a_to_b);
    let b_to_a = DirectionalStats::from_distances(&self.b_to_a);
    ChamferStats {
      chamfer_distance: (a_to_b.mean + b_to_a.mean) / 2.0,
      a_to_b,
      b_to_a,
    }
  }

  /// Hausdorff distance.
  pub fn hausdorff(&self) -> HausdorffStats {
    let max_a_to_b = self.a_to_b.iter().copied().fold(0.0, f64::max);
    let max_b_to_a = self.b_to_a.iter().copied().fold(0.0, f64::max);
    HausdorffStats {
      hausdorff_distance: max_a_to_b.max(max_b_to_a),
      max_a_to_b,
      max_b_to_a,
    }
  }

  /// Matched-point percentages for `threshold`.
  ///
  /// # Errors
  /// [`OctreeError::InvalidParameter`] unless `threshold` is finite and
  /// positive.
  pub fn similarity(&self, threshold: f64) -> OctreeResult<SimilarityStats> {
    if !threshold.is_finite() || threshold <= 0.0 {
      return Err(OctreeError::invalid_parameter(
        "threshold",
        format!("must be finite and positive, got {threshold}"),
      ));
    }
    let within_threshold_a_to_b = percent_within(&self.a_to_b, threshold);
    let within_threshold_b_to_a = percent_within(&self.b_to_a, threshold);
    Ok(SimilarityStats {
      chamfer_distance: self.chamfer().chamfer_distance,
      hausdorff_distance: self.hausdorff().hausdorff_distance,
      threshold,
      within_threshold_a_to_b,
      within_threshold_b_to_a,
      similarity_percentage: (within_threshold_a_to_b + within_threshold_b_to_a) / 2.0,
    })
  }
}

/// Chamfer distance between `a` and `b`. See [`CloudComparison::chamfer`].
pub fn chamfer_distance(a: &[DVec3], b: &[DVec3], config: OctreeConfig) -> OctreeResult<ChamferStats> {
  Ok(CloudComparison::new(a, b, config)?.chamfer())
}

/// Hausdorff distance between `a` and `b`. See [`CloudComparison::hausdorff`].
pub fn hausdorff_distance(a: &[DVec3], b: &[DVec3], config: OctreeConfig) -> OctreeResult<HausdorffStats> {
  Ok(CloudComparison::new(a, b, config)?.hausdorff())
}

/// Similarity of `a` and `b` at `threshold`. See [`CloudComparison::similarity`].
pub fn similarity(a: &[DVec3], b: &[DVec3], threshold: f64, config: OctreeConfig) -> OctreeResult<SimilarityStats> {
  CloudComparison::new(a, b, config)?.similarity(threshold)
}

fn finite_points(points: &[DVec3], name: &'static str) -> OctreeResult<Vec<DVec3>> {
  let finite: Vec<DVec3> = points.iter().copied().filter(|p| p.is_finite()).collect();
  if finite.is_empty() {
    return Err(OctreeError::invalid_parameter(name, "point cloud has no finite points"));
  }
  Ok(finite)
}

fn percent_within(distances: &[f64], threshold: f64) -> f64 {
  if distances.is_empty() {
    return 0.0;
  }
  let within = distances.iter().filter(|d| **d <= threshold).count();
  100.0 * within as f64 / distances.len() as f64
}

#[cfg(test)]
#[path = "cloud_test.rs"]
mod cloud_test;
