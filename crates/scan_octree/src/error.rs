//! Error types for octree construction and maintenance.

use thiserror::Error;

use crate::node::NodeId;

/// Result type for octree operations.
pub type OctreeResult<T> = Result<T, OctreeError>;

/// Errors that can occur while building or mutating an octree.
///
/// Queries never fail: "nothing found" is an empty result, and inserting a
/// point outside the root bounds is a documented no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OctreeError {
  /// A tuning parameter is out of range.
  #[error("invalid parameter `{name}`: {reason}")]
  InvalidParameter {
    /// Name of the offending parameter.
    name: &'static str,
    /// Why the value was rejected.
    reason: String,
  },

  /// The arena reached a state the operation cannot proceed from.
  ///
  /// Indicates a logic defect in the caller, e.g. splitting a node twice.
  #[error("invalid state at node {node:?}: {reason}")]
  InvalidState {
    /// Node the operation was attempted on.
    node: NodeId,
    /// What was wrong with it.
    reason: &'static str,
  },
}

impl OctreeError {
  pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidParameter {
      name,
      reason: reason.into(),
    }
  }
}
