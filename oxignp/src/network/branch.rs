use crate::{BranchId, NodeId, SubnodeId};

use serde::{Deserialize, Serialize};

/// An edge leaving a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub(super) id: BranchId,
    pub(super) gene: usize,
    pub(super) target: NodeId,
    pub(super) subnode: SubnodeId,
}

impl Branch {
    pub fn id(&self) -> BranchId {
        self.id
    }

    /// Genome index of the target gene.
    pub fn gene(&self) -> usize {
        self.gene
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The subnode whose outcomes lead through this branch.
    pub fn subnode(&self) -> SubnodeId {
        self.subnode
    }
}
