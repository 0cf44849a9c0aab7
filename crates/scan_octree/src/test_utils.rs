//! Shared helpers for unit tests: seeded clouds, brute-force oracles and an
//! invariant checker.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bounds::Aabb3;
use crate::node::{NodeId, NodeKind};
use crate::octree::PointOctree;

/// `count` uniform points in the unit cube, reproducible per `seed`.
pub fn random_cloud(seed: u64, count: usize) -> Vec<DVec3> {
  random_cloud_in(seed, count, &Aabb3::new(DVec3::ZERO, DVec3::ONE))
}

/// `count` uniform points inside `bounds`, reproducible per `seed`.
pub fn random_cloud_in(seed: u64, count: usize, bounds: &Aabb3) -> Vec<DVec3> {
  let mut rng = StdRng::seed_from_u64(seed);
  let extent = bounds.extent();
  (0..count)
    .map(|_| {
      bounds.min
        + DVec3::new(
          rng.random::<f64>() * extent.x,
          rng.random::<f64>() * extent.y,
          rng.random::<f64>() * extent.z,
        )
    })
    .collect()
}

/// Closest point by linear scan, first minimum wins.
pub fn brute_force_nearest(points: &[DVec3], position: DVec3) -> Option<(DVec3, f64)> {
  points.iter().fold(None, |best, &p| {
    let d = p.distance(position);
    match best {
      Some((_, best_d)) if best_d <= d => best,
      _ => Some((p, d)),
    }
  })
}

/// Points within `radius` of `center` by linear scan.
pub fn brute_force_in_radius(points: &[DVec3], center: DVec3, radius: f64) -> Vec<DVec3> {
  points
    .iter()
    .copied()
    .filter(|p| p.distance_squared(center) <= radius * radius)
    .collect()
}

/// Lexicographic order on coordinates, for comparing point sets.
pub fn sorted(mut points: Vec<DVec3>) -> Vec<DVec3> {
  points.sort_by(|a, b| {
    a.x
      .total_cmp(&b.x)
      .then(a.y.total_cmp(&b.y))
      .then(a.z.total_cmp(&b.z))
  });
  points
}

/// Depth-first signature of the tree: depth plus, for leaves, the stored
/// points. Arena ids are deliberately left out.
pub fn shape(tree: &PointOctree) -> Vec<(u32, Option<Vec<DVec3>>)> {
  let mut out = Vec::new();
  tree.walk(|_, node| {
    let points = match &node.kind {
      NodeKind::Leaf(points) => Some(points.clone()),
      NodeKind::Interior(_) => None,
    };
    out.push((node.depth, points));
  });
  out
}

/// Assert every structural invariant of the tree.
pub fn assert_invariants(tree: &PointOctree) {
  let config = tree.config();
  let mut leaf_sum = 0usize;
  let mut reached = vec![false; tree.nodes().len()];

  tree.walk(|id, node| {
    assert!(!reached[id.index()], "{id:?} reachable twice");
    reached[id.index()] = true;
    assert!(node.depth <= config.max_depth, "{id:?} deeper than cap");
    assert_eq!(node.center, node.bounds.center(), "{id:?} stale center");

    match &node.kind {
      NodeKind::Leaf(points) => {
        leaf_sum += points.len();
        for p in points {
          assert!(node.bounds.contains_point(*p), "{p:?} outside leaf {id:?}");
        }
        if points.len() > config.max_points_per_node {
          assert_eq!(node.depth, config.max_depth, "{id:?} overflowing below cap");
        }
      }
      NodeKind::Interior(children) => {
        let mut volume = 0.0;
        for (octant, child) in children.iter().enumerate() {
          let child_node = &tree.nodes()[child.index()];
          assert_eq!(child_node.depth, node.depth + 1);
          assert_eq!(child_node.bounds, node.bounds.octant(octant as u8));
          assert!(node.bounds.contains_aabb(&child_node.bounds));
          volume += child_node.bounds.volume();
        }
        let parent_volume = node.bounds.volume();
        assert!(
          (volume - parent_volume).abs() <= parent_volume * 1e-9,
          "children of {id:?} do not tile the parent"
        );
      }
    }
  });

  assert!(reached.iter().all(|r| *r), "arena holds unreachable nodes");
  assert_eq!(leaf_sum, tree.len(), "leaf sum disagrees with insert counter");
  assert_eq!(
    tree.nodes()[NodeId::ROOT.index()].depth,
    0,
    "root must sit at depth 0"
  );
}
