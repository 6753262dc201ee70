// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Engine Errors

use crate::types::Node;

/// Invariant violations raised by the graph engine.
///
/// None of these are expected during a run that started from a well-formed
/// structure; any of them means the population is corrupted and the run
/// should stop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("duplicate node `{node}`")]
    DuplicateNode { node: Node },

    #[error("node `{node}` is not in this graph")]
    UnknownNode { node: Node },

    #[error("bond {src}-{dest} already exists")]
    DuplicateBond { src: Node, dest: Node },

    #[error("bond {src}-{dest} does not exist")]
    BondNotFound { src: Node, dest: Node },

    #[error("self bond on node `{node}`")]
    SelfBond { node: Node },

    #[error("potential reform bond {src}-{dest} already exists")]
    DuplicatePotentialBond { src: Node, dest: Node },

    #[error("potential reform bond {src}-{dest} does not exist")]
    PotentialBondNotFound { src: Node, dest: Node },

    #[error("no graph in the population owns node `{node}`")]
    GraphNotFound { node: Node },
}

impl EngineError {
    /// Short name of the violated invariant, for run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateNode { .. } => "DuplicateNode",
            Self::UnknownNode { .. } => "UnknownNode",
            Self::DuplicateBond { .. } => "DuplicateBond",
            Self::BondNotFound { .. } => "BondNotFound",
            Self::SelfBond { .. } => "SelfBond",
            Self::DuplicatePotentialBond { .. } => "DuplicatePotentialBond",
            Self::PotentialBondNotFound { .. } => "PotentialBondNotFound",
            Self::GraphNotFound { .. } => "GraphNotFound",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
