//! # Meshtopo
//!
//! A half-edge polygon mesh topology kernel.
//!
//! Meshtopo builds a half-edge mesh from independently declared face loops,
//! pairs the loops that share edges, propagates a consistent orientation
//! across them and edits the result with Euler operators that keep the
//! manifold invariants intact.
//!
//! ## Features
//!
//! - **Half-edge data structure**: arena records with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Any face degree**: triangles, quads and general polygons
//! - **Edge matching**: non-manifold edges are reported, never resolved silently
//! - **Orientation propagation**: per-component BFS with non-orientability detection
//! - **Euler operators**: split/join faces, subdivide and collapse edges, destroy entities
//!
//! ## Quick Start
//!
//! ```
//! use meshtopo::prelude::*;
//!
//! // Four triangles of a tetrahedron; the second one is wound backwards.
//! let faces = vec![[0, 2, 1], [0, 3, 1], [1, 2, 3], [2, 0, 3]];
//! let BuiltMesh { mut mesh, keys }: BuiltMesh<u32> =
//!     build_mesh(&faces, &BuildOptions::default()).unwrap();
//!
//! let tags = orient_and_link(&mut mesh).unwrap();
//! assert_eq!(tags.components(), 1);
//! assert!(mesh.is_valid());
//!
//! // Closed surface: every vertex has a full fan.
//! let v0 = keys.get(&0).unwrap();
//! assert!(!mesh.is_boundary_vertex(v0));
//! assert_eq!(mesh.valence(v0), 3);
//! ```
//!
//! ## Editing
//!
//! ```
//! use meshtopo::prelude::*;
//!
//! let BuiltMesh { mut mesh, keys }: BuiltMesh<&str> =
//!     build_mesh(&[["a", "b", "c", "d"]], &BuildOptions::default()).unwrap();
//! let quad = mesh.face_ids().next().unwrap();
//! let a = keys.get(&"a").unwrap();
//! let c = keys.get(&"c").unwrap();
//!
//! // Cut the quad along its diagonal, then undo the cut.
//! let split = mesh.split_face(quad, a, c).unwrap();
//! assert_eq!(mesh.num_faces(), 2);
//! mesh.join_face(split.face, split.new_face, split.halfedge).unwrap();
//! assert_eq!(mesh.degree(quad), 4);
//!
//! // Failed operators leave the mesh untouched.
//! assert!(matches!(
//!     mesh.split_face(quad, a, a),
//!     Err(MeshError::DegenerateSplit { .. })
//! ));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use meshtopo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::orient::{orient_and_link, propagate_orientation, OrientationTags};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_mesh, BoundaryPolicy, BuildOptions, BuiltMesh, CollapseOptions,
        DuplicateVertexPolicy, EdgeMatchIndex, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex,
        Orientation, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_octahedron_pipeline() {
        let faces = vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![0, 3, 4],
            vec![0, 4, 1],
            vec![5, 1, 2], // declared backwards
            vec![5, 3, 2],
            vec![5, 4, 3],
            vec![5, 1, 4],
        ];
        let BuiltMesh { mut mesh, keys }: BuiltMesh<u32> =
            build_mesh(&faces, &BuildOptions::default()).unwrap();

        let tags = orient_and_link(&mut mesh).unwrap();
        assert_eq!(tags.flipped().count(), 1);
        assert!(mesh.is_valid());

        // Closed mesh: 8 faces * 3 half-edges, all twinned.
        assert_eq!(mesh.num_halfedges(), 24);
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
            assert_eq!(mesh.valence(v), 4);
        }

        let top = keys.get(&0).unwrap();
        let side = keys.get(&1).unwrap();
        mesh.collapse_edge(top, side).unwrap();
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 6);
    }
}
