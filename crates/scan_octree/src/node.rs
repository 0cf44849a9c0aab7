//! Arena records for the octree.
//!
//! Nodes live in a flat `Vec` owned by [`PointOctree`](crate::PointOctree)
//! and refer to each other by [`NodeId`]. A node is either a leaf holding
//! points or an interior node holding exactly 8 child ids; the two states are
//! separate enum variants so an interior node cannot carry points.

use glam::DVec3;

use crate::bounds::Aabb3;

/// Index of a node in the octree arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
  /// The root is always the first record in the arena.
  pub const ROOT: Self = Self(0);

  /// Position of the node in the arena.
  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }

  /// Id for arena position `index`, or `None` past the `u32` id range.
  #[inline]
  pub(crate) fn try_from_index(index: usize) -> Option<Self> {
    u32::try_from(index).ok().map(Self)
  }

  /// Ids of 8 siblings stored consecutively from arena position `first`.
  pub(crate) fn siblings_from(first: usize) -> Option<[Self; 8]> {
    Self::try_from_index(first.checked_add(7)?)?;
    let first = first as u32;
    Some(std::array::from_fn(|octant| Self(first + octant as u32)))
  }
}

/// Leaf or interior payload of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
  /// Points stored directly, in insertion order.
  Leaf(Vec<DVec3>),
  /// Children in octant order (bit 0 = +X, bit 1 = +Y, bit 2 = +Z).
  Interior([NodeId; 8]),
}

/// A single octree node.
///
/// `center` and `size` are cached from `bounds` when the node is created and
/// never change afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
  /// Region covered by this node.
  pub bounds: Aabb3,
  /// Center of `bounds`.
  pub center: DVec3,
  /// Diagonal length of `bounds`.
  pub size: f64,
  /// Nesting level (root = 0).
  pub depth: u32,
  /// Leaf points or child ids.
  pub kind: NodeKind,
}

impl Node {
  /// Create an empty leaf covering `bounds`.
  pub fn leaf(bounds: Aabb3, depth: u32) -> Self {
    Self {
      bounds,
      center: bounds.center(),
      size: bounds.size(),
      depth,
      kind: NodeKind::Leaf(Vec::new()),
    }
  }

  /// True if this node has no children.
  #[inline]
  pub fn is_leaf(&self) -> bool {
    matches!(self.kind, NodeKind::Leaf(_))
  }

  /// Points stored at this node (always empty for interior nodes).
  #[inline]
  pub fn points(&self) -> &[DVec3] {
    match &self.kind {
      NodeKind::Leaf(points) => points,
      NodeKind::Interior(_) => &[],
    }
  }

  /// Child ids, or `None` for a leaf.
  #[inline]
  pub fn children(&self) -> Option<&[NodeId; 8]> {
    match &self.kind {
      NodeKind::Leaf(_) => None,
      NodeKind::Interior(children) => Some(children),
    }
  }
}
