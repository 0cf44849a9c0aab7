//! Read-only queries: nearest point, k nearest points, radius search.
//!
//! Every query prunes with the same lower bound: the distance from the query
//! position to the closest point of a node's box. A subtree whose box is
//! farther than the current best (or the search radius) cannot contribute.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::DVec3;
use smallvec::SmallVec;
use web_time::Instant;

use crate::node::{NodeId, NodeKind};
use crate::octree::PointOctree;

/// Nodes visited between deadline checks in [`PointOctree::find_nearest_within`].
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// A stored point together with its distance to the query position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
  /// The stored point.
  pub point: DVec3,
  /// Euclidean distance from the query position.
  pub distance: f64,
}

/// Result of a time-bounded nearest-point query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NearestOutcome {
  /// Search completed and found the closest point within range.
  Found(Nearest),
  /// Search completed: no point lies within range.
  NotFound,
  /// Deadline passed before the search completed. The best candidate seen so
  /// far is reported but may not be the true nearest point.
  BudgetExceeded {
    /// Best point found before the deadline, if any.
    best_so_far: Option<Nearest>,
  },
}

impl NearestOutcome {
  /// The confirmed nearest point, if the search completed and found one.
  pub fn found(self) -> Option<Nearest> {
    match self {
      Self::Found(nearest) => Some(nearest),
      Self::NotFound | Self::BudgetExceeded { .. } => None,
    }
  }

  /// True if the deadline cut the search short.
  pub fn is_budget_exceeded(&self) -> bool {
    matches!(self, Self::BudgetExceeded { .. })
  }
}

/// Depth-first branch-and-bound search for a single nearest point.
struct NearestSearch<'a> {
  tree: &'a PointOctree,
  position: DVec3,
  /// Squared search bound: `max_distance²` until a point is found, then the
  /// best squared distance so far.
  bound_sq: f64,
  best: Option<DVec3>,
  deadline: Option<Instant>,
  visited: usize,
  expired: bool,
}

impl<'a> NearestSearch<'a> {
  fn new(tree: &'a PointOctree, position: DVec3, max_distance: f64, deadline: Option<Instant>) -> Self {
    Self {
      tree,
      position,
      bound_sq: max_distance * max_distance,
      best: None,
      deadline,
      visited: 0,
      expired: false,
    }
  }

  fn visit(&mut self, id: NodeId) {
    if self.expired || self.deadline_passed() {
      self.expired = true;
      return;
    }
    self.visited += 1;

    let tree = self.tree;
    let node = &tree.nodes[id.index()];
    if node.bounds.distance_squared_to(self.position) > self.bound_sq {
      return;
    }

    match &node.kind {
      NodeKind::Leaf(points) => {
        for &point in points {
          let dist_sq = point.distance_squared(self.position);
          // First hit may sit exactly on the bound; later hits must beat it.
          let better = if self.best.is_some() {
            dist_sq < self.bound_sq
          } else {
            dist_sq <= self.bound_sq
          };
          if better {
            self.best = Some(point);
            self.bound_sq = dist_sq;
          }
        }
      }
      NodeKind::Interior(children) => {
        for child in closest_first(tree, children, self.position) {
          self.visit(child);
        }
      }
    }
  }

  #[inline]
  fn deadline_passed(&self) -> bool {
    match self.deadline {
      Some(deadline) if self.visited % DEADLINE_CHECK_INTERVAL == 0 => Instant::now() >= deadline,
      _ => false,
    }
  }

  fn result(&self) -> Option<Nearest> {
    self.best.map(|point| Nearest {
      point,
      distance: self.bound_sq.sqrt(),
    })
  }
}

/// Children ordered by distance from `position` to their cached centers.
///
/// A heuristic: the closest center is likely to hold a good candidate early,
/// which tightens the bound for the remaining siblings. The sort is stable so
/// ties keep octant order.
fn closest_first(tree: &PointOctree, children: &[NodeId; 8], position: DVec3) -> SmallVec<[NodeId; 8]> {
  let mut order: SmallVec<[(f64, NodeId); 8]> = children
    .iter()
    .map(|&child| (tree.nodes[child.index()].center.distance_squared(position), child))
    .collect();
  order.sort_by(|a, b| a.0.total_cmp(&b.0));
  order.into_iter().map(|(_, child)| child).collect()
}

/// Max-heap entry keyed on squared distance, for k-nearest search.
#[derive(Clone, Copy, Debug)]
struct Candidate {
  dist_sq: f64,
  point: DVec3,
}

impl PartialEq for Candidate {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Candidate {
  fn cmp(&self, other: &Self) -> Ordering {
    self.dist_sq.total_cmp(&other.dist_sq)
  }
}

impl PointOctree {
  /// Closest stored point to `position` no farther than `max_distance`.
  ///
  /// Pass `f64::INFINITY` for an unbounded search. A point at exactly
  /// `max_distance` qualifies. Among equidistant points the first one reached
  /// by the traversal wins, so which of them is returned is unspecified.
  /// Negative or NaN `max_distance`, or a non-finite `position`, finds
  /// nothing.
  pub fn find_nearest(&self, position: DVec3, max_distance: f64) -> Option<DVec3> {
    self.find_nearest_entry(position, max_distance).map(|n| n.point)
  }

  /// Like [`find_nearest`](Self::find_nearest), also reporting the distance.
  pub fn find_nearest_entry(&self, position: DVec3, max_distance: f64) -> Option<Nearest> {
    if !position.is_finite() || max_distance.is_nan() || max_distance < 0.0 {
      return None;
    }
    let mut search = NearestSearch::new(self, position, max_distance, None);
    search.visit(NodeId::ROOT);
    search.result()
  }

  /// Nearest-point search that gives up once `deadline` has passed.
  ///
  /// The deadline is polled every few node visits, so the search may run
  /// slightly past it. [`NearestOutcome::NotFound`] is only returned when the
  /// whole relevant part of the tree was searched.
  pub fn find_nearest_within(&self, position: DVec3, max_distance: f64, deadline: Instant) -> NearestOutcome {
    if !position.is_finite() || max_distance.is_nan() || max_distance < 0.0 {
      return NearestOutcome::NotFound;
    }
    let mut search = NearestSearch::new(self, position, max_distance, Some(deadline));
    search.visit(NodeId::ROOT);

    if search.expired {
      tracing::trace!(visited = search.visited, "nearest search ran out of budget");
      return NearestOutcome::BudgetExceeded {
        best_so_far: search.result(),
      };
    }
    match search.result() {
      Some(nearest) => NearestOutcome::Found(nearest),
      None => NearestOutcome::NotFound,
    }
  }

  /// The `k` stored points closest to `position`, nearest first.
  ///
  /// Returns fewer than `k` entries when the tree holds fewer points, and
  /// none for a non-finite `position`.
  pub fn find_k_nearest(&self, position: DVec3, k: usize) -> Vec<Nearest> {
    if k == 0 || !position.is_finite() {
      return Vec::new();
    }

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k.min(self.len()) + 1);
    let mut stack: Vec<NodeId> = vec![NodeId::ROOT];

    while let Some(id) = stack.pop() {
      let node = &self.nodes[id.index()];
      let bound_sq = if heap.len() < k {
        f64::INFINITY
      } else {
        heap.peek().map_or(f64::INFINITY, |worst| worst.dist_sq)
      };
      if node.bounds.distance_squared_to(position) > bound_sq {
        continue;
      }

      match &node.kind {
        NodeKind::Leaf(points) => {
          for &point in points {
            let dist_sq = point.distance_squared(position);
            if heap.len() < k {
              heap.push(Candidate { dist_sq, point });
            } else if heap.peek().is_some_and(|worst| dist_sq < worst.dist_sq) {
              heap.pop();
              heap.push(Candidate { dist_sq, point });
            }
          }
        }
        NodeKind::Interior(children) => {
          // Stack pops last-in first, so push the closest child last.
          stack.extend(closest_first(self, children, position).into_iter().rev());
        }
      }
    }

    heap
      .into_sorted_vec()
      .into_iter()
      .map(|c| Nearest {
        point: c.point,
        distance: c.dist_sq.sqrt(),
      })
      .collect()
  }

  /// Call `visit` for every stored point within `radius` of `center`.
  ///
  /// Each point is reported once, in no particular order. Negative or NaN
  /// radii and non-finite centers report nothing.
  pub fn for_each_in_radius(&self, center: DVec3, radius: f64, mut visit: impl FnMut(DVec3)) {
    if !center.is_finite() || radius.is_nan() || radius < 0.0 {
      return;
    }
    let radius_sq = radius * radius;
    let mut stack: Vec<NodeId> = vec![NodeId::ROOT];

    while let Some(id) = stack.pop() {
      let node = &self.nodes[id.index()];
      if node.bounds.distance_squared_to(center) > radius_sq {
        continue;
      }
      match &node.kind {
        NodeKind::Leaf(points) => {
          for &point in points {
            if point.distance_squared(center) <= radius_sq {
              visit(point);
            }
          }
        }
        NodeKind::Interior(children) => stack.extend(children.iter()),
      }
    }
  }

  /// Every stored point within `radius` of `center` (inclusive).
  pub fn find_in_radius(&self, center: DVec3, radius: f64) -> Vec<DVec3> {
    let mut found = Vec::new();
    self.for_each_in_radius(center, radius, |p| found.push(p));
    found
  }

  /// Number of stored points within `radius` of `center`.
  pub fn count_in_radius(&self, center: DVec3, radius: f64) -> usize {
    let mut count = 0;
    self.for_each_in_radius(center, radius, |_| count += 1);
    count
  }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
