//! OctreeConfig - tuning parameters for octree construction.

use crate::error::{OctreeError, OctreeResult};

/// Margin added around the computed root bounds by [`PointOctree::build`].
///
/// Keeps points lying exactly on the extreme faces of the cloud inside the
/// root box regardless of rounding in the bounds computation.
///
/// [`PointOctree::build`]: crate::PointOctree::build
pub const DEFAULT_MARGIN: f64 = 1e-6;

/// Subtrees with fewer points than this are built on the calling thread by
/// [`PointOctree::build_parallel`](crate::PointOctree::build_parallel).
pub const DEFAULT_PARALLEL_CUTOFF: usize = 4096;

/// Largest accepted `max_depth`.
///
/// Splitting and nearest search recurse once per level. 64 halvings already
/// shrink any f64 box far below coordinate precision.
pub const MAX_DEPTH: u32 = 64;

/// Configuration for octree construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctreeConfig {
  /// A leaf splits once it holds more than this many points.
  pub max_points_per_node: usize,

  /// Deepest level a leaf may split to (root = 0).
  /// 0 means the root never splits.
  pub max_depth: u32,

  /// Margin added on every side of the computed root bounds.
  pub margin: f64,

  /// Minimum subtree point count worth handing to another rayon worker.
  pub parallel_cutoff: usize,
}

impl OctreeConfig {
  /// Balanced settings for scene-scale reconstructions.
  pub const DEFAULT: Self = Self {
    max_points_per_node: 50,
    max_depth: 10,
    margin: DEFAULT_MARGIN,
    parallel_cutoff: DEFAULT_PARALLEL_CUTOFF,
  };

  /// Small leaves and a deep tree: faster queries, larger arena.
  pub const FINE: Self = Self {
    max_points_per_node: 16,
    max_depth: 16,
    margin: DEFAULT_MARGIN,
    parallel_cutoff: DEFAULT_PARALLEL_CUTOFF,
  };

  /// Large leaves and a shallow tree: cheap builds for one-off queries.
  pub const COARSE: Self = Self {
    max_points_per_node: 256,
    max_depth: 6,
    margin: DEFAULT_MARGIN,
    parallel_cutoff: DEFAULT_PARALLEL_CUTOFF,
  };

  /// Config with the given leaf capacity and depth cap, other fields default.
  pub fn new(max_points_per_node: usize, max_depth: u32) -> Self {
    Self {
      max_points_per_node,
      max_depth,
      ..Self::DEFAULT
    }
  }

  /// Check every parameter, reporting the first one out of range.
  pub fn validate(&self) -> OctreeResult<()> {
    if self.max_points_per_node == 0 {
      return Err(OctreeError::invalid_parameter(
        "max_points_per_node",
        "must be at least 1, got 0",
      ));
    }
    if self.max_depth > MAX_DEPTH {
      return Err(OctreeError::invalid_parameter(
        "max_depth",
        format!("must be at most {MAX_DEPTH}, got {}", self.max_depth),
      ));
    }
    if !self.margin.is_finite() || self.margin < 0.0 {
      return Err(OctreeError::invalid_parameter(
        "margin",
        format!("must be finite and non-negative, got {}", self.margin),
      ));
    }
    if self.parallel_cutoff == 0 {
      return Err(OctreeError::invalid_parameter(
        "parallel_cutoff",
        "must be at least 1, got 0",
      ));
    }
    Ok(())
  }

  /// Whether a leaf at `depth` holding `point_count` points must split.
  #[inline]
  pub fn should_split(&self, point_count: usize, depth: u32) -> bool {
    point_count > self.max_points_per_node && depth < self.max_depth
  }
}

impl Default for OctreeConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
