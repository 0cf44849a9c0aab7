//! PointOctree - arena-backed octree over a 3D point set.
//!
//! # Structure
//!
//! All nodes live in one `Vec<Node>`; the root is [`NodeId::ROOT`]. Splitting
//! a leaf replaces its record with an interior record and appends 8 fresh
//! leaves, then pushes the leaf's points back down in their stored order.
//!
//! # Determinism
//!
//! Children are tried in octant order (bit 0 = +X, bit 1 = +Y, bit 2 = +Z)
//! and the first child whose bounds contain a point takes it. Boxes are
//! inclusive, so a point on a split plane goes to the lower-indexed octant.
//! Building twice from the same sequence with the same config yields the same
//! tree.

use glam::DVec3;

use crate::bounds::Aabb3;
use crate::config::OctreeConfig;
use crate::error::{OctreeError, OctreeResult};
use crate::node::{Node, NodeId, NodeKind};

/// Octree over points, built once and queried many times.
///
/// Queries take `&self` and can run from many threads at once. Mutation takes
/// `&mut self`; callers that need to update a shared tree rebuild and swap it.
#[derive(Clone, Debug)]
pub struct PointOctree {
  pub(crate) nodes: Vec<Node>,
  pub(crate) config: OctreeConfig,
  /// Points accepted by `insert`. Cross-checked against the leaf sum in
  /// `stats()`.
  pub(crate) inserted: usize,
}

impl PointOctree {
  /// Create an empty tree covering `bounds`.
  ///
  /// No margin is applied: the caller owns the box, and later inserts outside
  /// it are dropped.
  pub fn with_bounds(bounds: Aabb3, config: OctreeConfig) -> OctreeResult<Self> {
    config.validate()?;
    Ok(Self {
      nodes: vec![Node::leaf(bounds, 0)],
      config,
      inserted: 0,
    })
  }

  /// Build a tree over `points`, inserting them in order.
  ///
  /// The root box is the bounding box of the finite points grown by
  /// `config.margin`. An empty input yields a single empty leaf. Non-finite
  /// points are dropped.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "octree::build"))]
  pub fn build(points: &[DVec3], config: OctreeConfig) -> OctreeResult<Self> {
    config.validate()?;
    let mut tree = Self::with_bounds(root_bounds(points, &config), config)?;

    let mut dropped = 0usize;
    for &point in points {
      if !tree.insert(point) {
        dropped += 1;
      }
    }

    tracing::debug!(
      points = tree.inserted,
      dropped,
      nodes = tree.nodes.len(),
      "built octree"
    );
    Ok(tree)
  }

  /// Insert a point, returning `false` if it lies outside the root bounds.
  ///
  /// Out-of-bounds points are silently skipped rather than reported as
  /// errors, so callers can stream unfiltered data into a fixed box.
  pub fn insert(&mut self, point: DVec3) -> bool {
    if !self.nodes[NodeId::ROOT.index()].bounds.contains_point(point) {
      tracing::trace!(?point, "point outside root bounds, skipped");
      return false;
    }
    let stored = self.insert_into(NodeId::ROOT, point);
    if stored {
      self.inserted += 1;
    }
    stored
  }

  /// Descend from `id` and store `point` in the leaf that takes it,
  /// splitting that leaf if it overflows.
  pub(crate) fn insert_into(&mut self, mut id: NodeId, point: DVec3) -> bool {
    loop {
      let node = &mut self.nodes[id.index()];
      let depth = node.depth;
      let children = match &mut node.kind {
        NodeKind::Interior(children) => *children,
        NodeKind::Leaf(points) => {
          points.push(point);
          let len = points.len();
          if self.config.should_split(len, depth) {
            if let Err(err) = self.split(id) {
              tracing::warn!(%err, "overflowing leaf left unsplit");
            }
          }
          return true;
        }
      };

      match self.first_child_containing(&children, point) {
        Some(child) => id = child,
        None => return false,
      }
    }
  }

  /// Turn leaf `id` into an interior node with 8 children and push its points
  /// down into them.
  ///
  /// Insertion calls this when a leaf overflows; calling it directly forces a
  /// split regardless of the leaf's point count.
  ///
  /// # Errors
  /// [`OctreeError::InvalidState`] if `id` is unknown, already interior, at
  /// the configured depth cap, or if the arena has no ids left for 8 more
  /// nodes.
  pub fn split(&mut self, id: NodeId) -> OctreeResult<()> {
    let points = self.split_leaf(id)?;
    for point in points {
      let stored = self.insert_into(id, point);
      debug_assert!(stored, "children of a split must cover the parent");
    }
    Ok(())
  }

  fn split_leaf(&mut self, id: NodeId) -> OctreeResult<Vec<DVec3>> {
    let Some(node) = self.nodes.get(id.index()) else {
      return Err(OctreeError::InvalidState {
        node: id,
        reason: "node does not exist",
      });
    };
    if !node.is_leaf() {
      return Err(OctreeError::InvalidState {
        node: id,
        reason: "node is already interior",
      });
    }
    if node.depth >= self.config.max_depth {
      return Err(OctreeError::InvalidState {
        node: id,
        reason: "node is at the depth cap",
      });
    }

    let Some(children) = NodeId::siblings_from(self.nodes.len()) else {
      return Err(OctreeError::InvalidState {
        node: id,
        reason: "arena is out of node ids",
      });
    };

    let bounds = node.bounds;
    let depth = node.depth + 1;
    self
      .nodes
      .extend((0..8u8).map(|octant| Node::leaf(bounds.octant(octant), depth)));

    match std::mem::replace(&mut self.nodes[id.index()].kind, NodeKind::Interior(children)) {
      NodeKind::Leaf(points) => Ok(points),
      NodeKind::Interior(_) => unreachable!("checked above"),
    }
  }

  #[inline]
  fn first_child_containing(&self, children: &[NodeId; 8], point: DVec3) -> Option<NodeId> {
    children
      .iter()
      .copied()
      .find(|child| self.nodes[child.index()].bounds.contains_point(point))
  }

  /// Leaf that holds (or would hold) `point`, following the insertion rule.
  pub fn leaf_containing(&self, point: DVec3) -> Option<NodeId> {
    let mut id = NodeId::ROOT;
    if !self.root().bounds.contains_point(point) {
      return None;
    }
    loop {
      match &self.nodes[id.index()].kind {
        NodeKind::Leaf(_) => return Some(id),
        NodeKind::Interior(children) => id = self.first_child_containing(children, point)?,
      }
    }
  }

  /// Root node.
  #[inline]
  pub fn root(&self) -> &Node {
    &self.nodes[NodeId::ROOT.index()]
  }

  /// Node by id.
  #[inline]
  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id.index())
  }

  /// All nodes in arena order.
  #[inline]
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  /// Root bounds.
  #[inline]
  pub fn bounds(&self) -> Aabb3 {
    self.root().bounds
  }

  /// Configuration the tree was built with.
  #[inline]
  pub fn config(&self) -> &OctreeConfig {
    &self.config
  }

  /// Number of points accepted so far.
  #[inline]
  pub fn len(&self) -> usize {
    self.inserted
  }

  /// True if no point has been stored.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.inserted == 0
  }

  /// Visit every node depth-first, children in octant order.
  pub fn walk(&self, mut visit: impl FnMut(NodeId, &Node)) {
    let mut stack = vec![NodeId::ROOT];
    while let Some(id) = stack.pop() {
      let node = &self.nodes[id.index()];
      visit(id, node);
      if let NodeKind::Interior(children) = &node.kind {
        stack.extend(children.iter().rev());
      }
    }
  }

  /// Every stored point, leaves visited depth-first.
  pub fn points(&self) -> Vec<DVec3> {
    let mut out = Vec::with_capacity(self.inserted);
    self.walk(|_, node| out.extend_from_slice(node.points()));
    out
  }
}

/// Root box for `points`: finite bounding box grown by the margin, or a
/// degenerate box at the origin for an empty cloud.
pub(crate) fn root_bounds(points: &[DVec3], config: &OctreeConfig) -> Aabb3 {
  Aabb3::from_points(points)
    .unwrap_or(Aabb3::new(DVec3::ZERO, DVec3::ZERO))
    .expanded(config.margin)
}

#[cfg(test)]
#[path = "octree_test.rs"]
mod octree_test;
