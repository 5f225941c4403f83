//! Error types for meshtopo.
//!
//! Every failure the kernel can report is a variant of [`MeshError`]. Handles
//! are reported by their raw slot index so that the error type does not
//! depend on the mesh's index width.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Kind of mesh entity, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// A vertex slot.
    Vertex(usize),
    /// A half-edge slot.
    HalfEdge(usize),
    /// A face slot.
    Face(usize),
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Vertex(i) => write!(f, "vertex {}", i),
            Entity::HalfEdge(i) => write!(f, "half-edge {}", i),
            Entity::Face(i) => write!(f, "face {}", i),
        }
    }
}

/// Errors that can occur during mesh construction, editing and orientation.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The face list was empty.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face loop is degenerate (too few vertices or a repeated vertex).
    #[error("face {face} is malformed: {reason}")]
    MalformedFace {
        /// Position of the face in the input list.
        face: usize,
        /// What is wrong with the loop.
        reason: &'static str,
    },

    /// An undirected edge is used by more than two faces.
    #[error("edge ({v0}, {v1}) has more than two incident faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex handed to an operator is not on the given face.
    #[error("vertex {vertex} is not on face {face}")]
    NotOnFace {
        /// The face.
        face: usize,
        /// The vertex.
        vertex: usize,
    },

    /// Two faces do not share the given edge.
    #[error("faces {f1} and {f2} are not adjacent across the given edge")]
    NotAdjacent {
        /// First face.
        f1: usize,
        /// Second face.
        f2: usize,
    },

    /// A face split would produce a face with fewer than three sides.
    #[error("cannot split face {face} between vertices {v1} and {v2}")]
    DegenerateSplit {
        /// The face.
        face: usize,
        /// First split vertex.
        v1: usize,
        /// Second split vertex.
        v2: usize,
    },

    /// Joining two faces would leave a loop that touches itself.
    #[error("faces {f1} and {f2} share more than one edge")]
    DegenerateJoin {
        /// First face.
        f1: usize,
        /// Second face.
        f2: usize,
    },

    /// Collapsing the edge violates the link condition.
    #[error("collapsing edge ({v0}, {v1}) would break manifoldness")]
    WouldDisconnect {
        /// Surviving vertex.
        v0: usize,
        /// Removed vertex.
        v1: usize,
    },

    /// Collapse of a boundary edge was rejected by the collapse policy.
    #[error("edge ({v0}, {v1}) touches the boundary and boundary collapse is disabled")]
    BoundaryCollapse {
        /// Surviving vertex.
        v0: usize,
        /// Removed vertex.
        v1: usize,
    },

    /// The two vertices are not joined by an edge.
    #[error("vertices {v0} and {v1} are not connected by an edge")]
    NotConnected {
        /// First vertex.
        v0: usize,
        /// Second vertex.
        v1: usize,
    },

    /// The entity cannot be destroyed because something still points at it.
    #[error("{entity} is still referenced")]
    StillReferenced {
        /// The entity that was to be destroyed.
        entity: Entity,
    },

    /// A handle refers to a destroyed (or never allocated) slot.
    #[error("{entity} is not live")]
    Destroyed {
        /// The stale handle.
        entity: Entity,
    },

    /// Orientation propagation found a contradiction.
    #[error("mesh is not orientable: faces {f1} and {f2} disagree")]
    NonOrientable {
        /// Face whose edge implied the conflicting tag.
        f1: usize,
        /// Already-tagged neighbor that disagrees.
        f2: usize,
    },

    /// A geometric operation needs a vertex position that was never attached.
    #[error("vertex {vertex} has no position")]
    MissingPosition {
        /// The vertex without a position.
        vertex: usize,
    },

    /// A structural invariant of the mesh does not hold.
    #[error("invalid mesh structure: {reason}")]
    InvalidStructure {
        /// The first violation found.
        reason: String,
    },

    /// Writer error at the serialization boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Create a malformed-face error.
    pub fn malformed(face: usize, reason: &'static str) -> Self {
        MeshError::MalformedFace { face, reason }
    }

    /// Create an invalid-structure error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        MeshError::InvalidStructure {
            reason: reason.into(),
        }
    }

    /// Create a non-manifold-edge error with endpoints in ascending order.
    pub fn non_manifold(a: usize, b: usize) -> Self {
        MeshError::NonManifoldEdge {
            v0: a.min(b),
            v1: a.max(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_entities() {
        let err = MeshError::StillReferenced {
            entity: Entity::Vertex(4),
        };
        assert_eq!(err.to_string(), "vertex 4 is still referenced");

        let err = MeshError::NonOrientable { f1: 2, f2: 3 };
        assert_eq!(
            err.to_string(),
            "mesh is not orientable: faces 2 and 3 disagree"
        );
    }

    #[test]
    fn test_non_manifold_orders_endpoints() {
        match MeshError::non_manifold(9, 2) {
            MeshError::NonManifoldEdge { v0, v1 } => assert_eq!((v0, v1), (2, 9)),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
