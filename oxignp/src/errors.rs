use crate::network::NodeType;
use crate::{BranchId, NodeId};

use thiserror::Error;

/// Errors raised while decoding, evaluating or
/// restoring a genetic network.
///
/// All variants are fatal for the individual being
/// processed: the operation that raised them is
/// abandoned without partially applying its effects.
#[derive(Debug, Error)]
pub enum GnpError {
    /// The configuration cannot describe a valid network.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Branch repair found no legal target node.
    #[error(
        "branch {branch} of node {node} has no legal target: \
         {excluded} of {available} node ids excluded"
    )]
    ExhaustedBranchTargets {
        node: NodeId,
        branch: BranchId,
        excluded: usize,
        available: usize,
    },
    /// A reward was NaN or infinite.
    #[error("non-finite reward value {0}")]
    NonFiniteReward(f64),
    /// A reward reached a distributor without a value.
    #[error("reward for evaluation {0} has no value")]
    MissingRewardValue(usize),
    /// Persisted text could not be decoded.
    #[error("malformed {what} text at position {position}: {reason}")]
    Parse {
        what: &'static str,
        position: usize,
        reason: String,
    },
    /// A subnode references a function id with no registered prototype.
    #[error("unknown {node_type:?} function id {id}")]
    UnknownFunction { node_type: NodeType, id: i64 },
    /// A node's subnode count gene is outside of the configured range.
    #[error("node {node} declares {count} subnodes, expected 1..={max}")]
    InvalidSubnodeCount { node: NodeId, count: i64, max: usize },
    /// A function returned an outcome it never registered.
    #[error("function {function:?} returned undeclared branch {branch:?}")]
    UnknownBranch { function: String, branch: String },
    /// The genome does not match the gene layout.
    #[error("genome has {actual} genes, layout requires {expected}")]
    GenomeLength { expected: usize, actual: usize },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GnpError>;

impl GnpError {
    pub(crate) fn parse(what: &'static str, position: usize, reason: impl Into<String>) -> GnpError {
        GnpError::Parse {
            what,
            position,
            reason: reason.into(),
        }
    }
}
