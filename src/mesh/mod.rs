//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation, its construction
//! from face loops, and the Euler operators that edit it.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], an arena of vertex, half-edge and
//! face records. Each face owns a cyclic loop of half-edges; a half-edge
//! points at its destination vertex and optionally at a twin (`sym`) on the
//! adjacent face. Faces may have any degree of three or more.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! Faces are declared independently as loops of caller-chosen vertex keys.
//! [`build_mesh`] interns the keys and builds the loops, then an
//! [`EdgeMatchIndex`] pairs the loops that share edges:
//!
//! ```
//! use meshtopo::mesh::{build_mesh, BuildOptions, BuiltMesh, EdgeMatchIndex};
//!
//! let faces = vec![["a", "b", "c"], ["c", "b", "d"]];
//! let BuiltMesh { mut mesh, keys } = build_mesh::<_, _, u32>(&faces, &BuildOptions::default()).unwrap();
//!
//! let index = EdgeMatchIndex::from_mesh(&mesh).unwrap();
//! assert_eq!(mesh.link_twins(&index), 1);
//!
//! let b = keys.get(&"b").unwrap();
//! assert_eq!(mesh.vertex_faces(b).count(), 2);
//! ```

mod attributes;
mod builder;
mod edge_match;
mod euler;
mod geometry;
mod halfedge;
mod index;
mod traverse;

pub use attributes::Attributes;
pub use builder::{
    build_mesh, to_face_list, BuildOptions, BuiltMesh, DuplicateVertexPolicy, VertexKeys,
};
pub use edge_match::{EdgeKey, EdgeMatchIndex, EdgeOccurrence};
pub use euler::{BoundaryPolicy, CollapseOptions, FaceSplit};
pub use geometry::Geometry;
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Lifecycle, Orientation, UserHandle, Vertex};
pub use index::{FaceId, HalfEdgeId, Handle, MeshIndex, VertexId};
pub use traverse::{FaceHalfEdgeIter, VertexEdgeIter, VertexFanIter};
