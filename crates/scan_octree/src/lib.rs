//! scan_octree - Point octree for indexing and cleaning 3D reconstructions
//!
//! This crate stores unstructured point clouds (camera positions, SfM
//! points, scan samples) in an adaptive octree and answers spatial queries
//! over them. Nodes live in a flat arena addressed by [`NodeId`]; leaves hold
//! points and split into eight octants once they exceed the configured
//! capacity, down to a depth cap.
//!
//! # Features
//!
//! - **Construction**: sequential [`PointOctree::build`] or subtree-parallel
//!   [`PointOctree::build_parallel`] (identical trees), plus incremental
//!   [`PointOctree::insert`]
//! - **Queries**: nearest point (optionally time-bounded), k nearest points,
//!   inclusive radius search
//! - **Cloud metrics**: Chamfer and Hausdorff distances, threshold similarity
//! - **Filters**: radius and statistical outlier removal, voxel down-sampling
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use scan_octree::{OctreeConfig, PointOctree};
//!
//! let points = vec![DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), DVec3::splat(2.0)];
//! let tree = PointOctree::build(&points, OctreeConfig::default()).unwrap();
//!
//! assert_eq!(tree.find_nearest(DVec3::splat(0.1), f64::INFINITY), Some(DVec3::ZERO));
//! assert_eq!(tree.count_in_radius(DVec3::ZERO, 1.0), 2);
//! ```
//!
//! # Concurrency
//!
//! Queries take `&self` and may run from any number of threads at once.
//! Mutation (`insert`, `split`) takes `&mut self`; callers sharing a tree
//! rebuild it and swap the new one in.

pub mod bounds;
pub mod config;
pub mod error;
pub mod node;

// Re-export commonly used items
pub use bounds::Aabb3;
pub use config::OctreeConfig;
pub use error::{OctreeError, OctreeResult};
pub use node::{Node, NodeId, NodeKind};

// Arena tree, construction and mutation
pub mod octree;
pub use octree::PointOctree;

// Nearest / k-nearest / radius queries
pub mod query;
pub use query::{Nearest, NearestOutcome};

// Structural statistics
pub mod stats;
pub use stats::OctreeStats;

// Rayon-backed construction
pub mod parallel;

// Cloud-to-cloud metrics
pub mod cloud;
pub use cloud::{
  chamfer_distance, hausdorff_distance, point_cloud_distance, similarity, ChamferStats,
  CloudComparison, DirectionalStats, HausdorffStats, SimilarityStats,
};

// Outlier removal and down-sampling
pub mod filter;
pub use filter::{
  radius_outlier_removal, statistical_outlier_removal, voxel_down_sample, OutlierRemoval,
};

#[cfg(test)]
mod test_utils;
