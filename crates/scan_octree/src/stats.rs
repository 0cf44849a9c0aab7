//! Structural statistics used to tune `max_points_per_node` / `max_depth`.

use crate::octree::PointOctree;

/// Snapshot of the tree's shape from a full walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeStats {
  /// Nodes reachable from the root (leaves and interior).
  pub node_count: usize,
  /// Leaf nodes.
  pub leaf_count: usize,
  /// Points stored across all leaves.
  pub point_count: usize,
  /// Deepest node level present (root = 0).
  pub max_depth_observed: u32,
  /// Largest number of points held by a single leaf.
  pub max_leaf_points: usize,
}

impl OctreeStats {
  /// Interior nodes.
  #[inline]
  pub fn interior_count(&self) -> usize {
    self.node_count - self.leaf_count
  }

  /// Mean points per leaf (0 for a tree without leaves).
  #[inline]
  pub fn average_leaf_points(&self) -> f64 {
    if self.leaf_count == 0 {
      0.0
    } else {
      self.point_count as f64 / self.leaf_count as f64
    }
  }
}

impl PointOctree {
  /// Walk the whole tree and summarize its shape.
  ///
  /// `point_count` is the sum over leaves; in debug builds it is checked
  /// against the running insert counter.
  pub fn stats(&self) -> OctreeStats {
    let mut stats = OctreeStats::default();
    self.walk(|_, node| {
      stats.node_count += 1;
      stats.max_depth_observed = stats.max_depth_observed.max(node.depth);
      if node.is_leaf() {
        let points = node.points().len();
        stats.leaf_count += 1;
        stats.point_count += points;
        stats.max_leaf_points = stats.max_leaf_points.max(points);
      }
    });

    debug_assert_eq!(
      stats.point_count, self.inserted,
      "leaf point sum disagrees with insert counter"
    );
    stats
  }
}

#[cfg(test)]
mod tests {
  use glam::DVec3;

  use super::*;
  use crate::config::OctreeConfig;
  use crate::test_utils::random_cloud;

  #[test]
  fn test_empty_tree_stats() {
    let tree = PointOctree::build(&[], OctreeConfig::default()).unwrap();
    let stats = tree.stats();

    assert_eq!(stats.point_count, 0);
    assert_eq!(stats.node_count, 1);
    assert_eq!(stats.leaf_count, 1);
    assert_eq!(stats.max_depth_observed, 0);
    assert_eq!(stats.average_leaf_points(), 0.0);
  }

  #[test]
  fn test_stats_after_single_split() {
    let points = [
      DVec3::splat(0.1),
      DVec3::splat(0.9),
      DVec3::new(0.9, 0.1, 0.1),
    ];
    let tree = PointOctree::build(&points, OctreeConfig::new(2, 4)).unwrap();
    let stats = tree.stats();

    assert_eq!(stats.node_count, 9);
    assert_eq!(stats.leaf_count, 8);
    assert_eq!(stats.interior_count(), 1);
    assert_eq!(stats.point_count, 3);
    assert_eq!(stats.max_depth_observed, 1);
    assert_eq!(stats.max_leaf_points, 1);
  }

  #[test]
  fn test_stats_match_tree() {
    let points = random_cloud(31, 10_000);
    let config = OctreeConfig::new(20, 7);
    let tree = PointOctree::build(&points, config).unwrap();
    let stats = tree.stats();

    assert_eq!(stats.point_count, points.len());
    assert_eq!(stats.point_count, tree.len());
    assert_eq!(stats.node_count, tree.nodes().len());
    assert_eq!((stats.node_count - 1) % 8, 0, "every split adds 8 nodes");
    assert!(stats.max_depth_observed <= config.max_depth);
    assert!(stats.max_leaf_points <= config.max_points_per_node);
  }

  /// Out-of-bounds drops do not show up in the counts.
  #[test]
  fn test_stats_ignore_dropped_points() {
    let bounds = crate::bounds::Aabb3::new(DVec3::ZERO, DVec3::ONE);
    let mut tree = PointOctree::with_bounds(bounds, OctreeConfig::default()).unwrap();
    tree.insert(DVec3::splat(0.5));
    tree.insert(DVec3::splat(5.0));

    assert_eq!(tree.stats().point_count, 1);
  }
}
