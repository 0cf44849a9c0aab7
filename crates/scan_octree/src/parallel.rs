//! Subtree-parallel construction on rayon's thread pool.
//!
//! Sibling octants never overlap in volume, so once a node's points are
//! partitioned into its 8 octant buckets each bucket can be built
//! independently. Every bucket becomes its own small arena; the arenas are
//! then appended to the parent's arena with their child ids shifted.
//!
//! Partitioning uses the same first-containing-octant rule as insertion and
//! keeps each bucket in input order, so the result has exactly the shape and
//! per-leaf point order of [`PointOctree::build`]. Only arena ids differ.

use glam::DVec3;
use rayon::prelude::*;

use crate::bounds::Aabb3;
use crate::config::OctreeConfig;
use crate::error::{OctreeError, OctreeResult};
use crate::node::{Node, NodeId, NodeKind};
use crate::octree::{root_bounds, PointOctree};

impl PointOctree {
  /// Build a tree over `points`, building sibling subtrees in parallel.
  ///
  /// Subtrees with fewer than `config.parallel_cutoff` points are built on
  /// the current worker.
  #[cfg_attr(feature = "spans", tracing::instrument(skip_all, name = "octree::build_parallel"))]
  pub fn build_parallel(points: &[DVec3], config: OctreeConfig) -> OctreeResult<Self> {
    config.validate()?;
    let bounds = root_bounds(points, &config);

    let accepted: Vec<DVec3> = points
      .iter()
      .copied()
      .filter(|p| bounds.contains_point(*p))
      .collect();
    let inserted = accepted.len();
    let nodes = build_subtree(bounds, 0, accepted, &config)?;

    tracing::debug!(
      points = inserted,
      dropped = points.len() - inserted,
      nodes = nodes.len(),
      threads = rayon::current_num_threads(),
      "built octree in parallel"
    );
    Ok(Self {
      nodes,
      config,
      inserted,
    })
  }
}

/// Arena for the subtree rooted at a leaf covering `bounds` at `depth`.
/// Index 0 of the returned arena is the subtree root.
fn build_subtree(
  bounds: Aabb3,
  depth: u32,
  points: Vec<DVec3>,
  config: &OctreeConfig,
) -> OctreeResult<Vec<Node>> {
  if points.len() < config.parallel_cutoff || !config.should_split(points.len(), depth) {
    return Ok(build_sequential(bounds, depth, points, config));
  }

  let octants: [Aabb3; 8] = std::array::from_fn(|octant| bounds.octant(octant as u8));
  let buckets = partition(&octants, points);

  let subtrees: Vec<Vec<Node>> = buckets
    .into_par_iter()
    .zip(octants)
    .map(|(bucket, child_bounds)| build_subtree(child_bounds, depth + 1, bucket, config))
    .collect::<OctreeResult<_>>()?;

  stitch(bounds, depth, subtrees)
}

fn build_sequential(bounds: Aabb3, depth: u32, points: Vec<DVec3>, config: &OctreeConfig) -> Vec<Node> {
  let mut subtree = PointOctree {
    nodes: vec![Node::leaf(bounds, depth)],
    config: *config,
    inserted: 0,
  };
  for point in points {
    let stored = subtree.insert_into(NodeId::ROOT, point);
    debug_assert!(stored, "partitioned point must fit its octant");
  }
  subtree.nodes
}

/// Split `points` into per-octant buckets, preserving input order.
fn partition(octants: &[Aabb3; 8], points: Vec<DVec3>) -> Vec<Vec<DVec3>> {
  let mut buckets: Vec<Vec<DVec3>> = vec![Vec::new(); 8];
  for point in points {
    if let Some(octant) = octants.iter().position(|b| b.contains_point(point)) {
      buckets[octant].push(point);
    }
  }
  buckets
}

/// Interior node over `bounds` whose children are the given subtree arenas.
///
/// # Errors
/// [`OctreeError::InvalidState`] if the combined arena needs ids past the
/// `u32` range.
fn stitch(bounds: Aabb3, depth: u32, subtrees: Vec<Vec<Node>>) -> OctreeResult<Vec<Node>> {
  let total = 1 + subtrees.iter().map(Vec::len).sum::<usize>();
  if NodeId::try_from_index(total - 1).is_none() {
    return Err(OctreeError::InvalidState {
      node: NodeId::ROOT,
      reason: "arena is out of node ids",
    });
  }

  let mut nodes = Vec::with_capacity(total);
  nodes.push(Node::leaf(bounds, depth));

  // Every position below `total` fits in u32, checked above.
  let mut children = [NodeId::ROOT; 8];
  for (octant, subtree) in subtrees.into_iter().enumerate() {
    let base = nodes.len() as u32;
    children[octant] = NodeId(base);
    nodes.extend(subtree.into_iter().map(|mut node| {
      if let NodeKind::Interior(ids) = &mut node.kind {
        for id in ids.iter_mut() {
          id.0 += base;
        }
      }
      node
    }));
  }

  nodes[0].kind = NodeKind::Interior(children);
  Ok(nodes)
}
