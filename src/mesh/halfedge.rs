//! Half-edge mesh data structure.
//!
//! This module provides the entity records and the arena that owns them.
//! Faces are arbitrary polygons (degree ≥ 3).
//!
//! # Structure
//!
//! - Each face owns a cyclic loop of **half-edges** linked by `next`/`prev`
//! - Each half-edge stores the vertex it points **at** (`dest`), the face that
//!   owns it, and optionally its **sym**: the opposite half-edge on the
//!   adjacent face
//! - Each vertex stores one incoming half-edge (its representative)
//! - Each face stores one half-edge of its loop (its entry)
//!
//! # Boundary Handling
//!
//! There are no boundary half-edges. A half-edge without a `sym` lies on the
//! mesh boundary, and so does the undirected edge it represents.
//!
//! # Lifetime
//!
//! Slots are allocated by construction and by Euler operators and are never
//! reused. Destroying an entity marks its slot [`Lifecycle::Destroyed`];
//! accessors that return [`Result`] reject such handles with
//! [`MeshError::Destroyed`].

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{Entity, MeshError, Result};

/// Lifecycle state of an entity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// The entity participates in the mesh.
    #[default]
    Live,
    /// The entity was removed. Its slot is never reused.
    Destroyed,
}

/// Opaque caller-assigned handle to external payload (geometry, material...).
///
/// The kernel stores it and hands it back; it never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserHandle(pub u64);

/// Orientation tag of a face, relative to its component's seed face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Not reached by orientation propagation.
    #[default]
    Unprocessed,
    /// Keep the declared winding.
    Accepted,
    /// Reverse the declared winding.
    Flipped,
}

impl Orientation {
    /// The opposite tag. `Unprocessed` stays `Unprocessed`.
    #[inline]
    pub fn inverted(self) -> Self {
        match self {
            Orientation::Accepted => Orientation::Flipped,
            Orientation::Flipped => Orientation::Accepted,
            Orientation::Unprocessed => Orientation::Unprocessed,
        }
    }
}

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// One half-edge pointing at this vertex. Invalid for isolated vertices.
    pub halfedge: HalfEdgeId<I>,

    /// Caller payload handle.
    pub user: Option<UserHandle>,

    /// Slot state.
    pub state: Lifecycle,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new isolated vertex.
    pub fn new() -> Self {
        Self {
            halfedge: HalfEdgeId::invalid(),
            user: None,
            state: Lifecycle::Live,
        }
    }

    /// Check if this vertex has no incident half-edge.
    #[inline]
    pub fn is_isolated(&self) -> bool {
        !self.halfedge.is_valid()
    }
}

impl<I: MeshIndex> Default for Vertex<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge points at.
    pub dest: VertexId<I>,

    /// The next half-edge around the face.
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId<I>,

    /// The opposite half-edge on the adjacent face. Invalid on the boundary.
    pub sym: HalfEdgeId<I>,

    /// The face owning this half-edge.
    pub face: FaceId<I>,

    /// Slot state.
    pub state: Lifecycle,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge.
    pub fn new() -> Self {
        Self {
            dest: VertexId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            sym: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            state: Lifecycle::Live,
        }
    }

    /// Check if this half-edge has no twin.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.sym.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A polygonal face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge of the face's loop.
    pub halfedge: HalfEdgeId<I>,

    /// Orientation tag written by orientation propagation.
    pub orientation: Orientation,

    /// Caller payload handle.
    pub user: Option<UserHandle>,

    /// Slot state.
    pub state: Lifecycle,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given entry half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self {
            halfedge,
            orientation: Orientation::Unprocessed,
            user: None,
            state: Lifecycle::Live,
        }
    }
}

/// A half-edge mesh of polygonal faces.
///
/// The mesh owns every vertex, half-edge and face record. Handles are plain
/// indices into its arenas; they stay meaningful for the lifetime of the mesh
/// and are rejected once the entity they name has been destroyed.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,

    live_vertices: usize,
    live_halfedges: usize,
    live_faces: usize,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
            live_vertices: 0,
            live_halfedges: 0,
            live_faces: 0,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_halfedges: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
            ..Self::new()
        }
    }

    // ==================== Counts ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.live_vertices
    }

    /// Number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.live_halfedges
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.live_faces
    }

    /// Number of vertex slots ever allocated, live or destroyed.
    #[inline]
    pub fn vertex_slots(&self) -> usize {
        self.vertices.len()
    }

    /// Number of half-edge slots ever allocated, live or destroyed.
    #[inline]
    pub fn halfedge_slots(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of face slots ever allocated, live or destroyed.
    #[inline]
    pub fn face_slots(&self) -> usize {
        self.faces.len()
    }

    // ==================== Record access ====================

    /// Get a vertex record by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge record by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face record by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    #[inline]
    pub(crate) fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    // ==================== Liveness ====================

    /// Check if a vertex handle names a live vertex.
    #[inline]
    pub fn is_live_vertex(&self, v: VertexId<I>) -> bool {
        v.is_valid()
            && self
                .vertices
                .get(v.index())
                .is_some_and(|r| r.state == Lifecycle::Live)
    }

    /// Check if a half-edge handle names a live half-edge.
    #[inline]
    pub fn is_live_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        he.is_valid()
            && self
                .halfedges
                .get(he.index())
                .is_some_and(|r| r.state == Lifecycle::Live)
    }

    /// Check if a face handle names a live face.
    #[inline]
    pub fn is_live_face(&self, f: FaceId<I>) -> bool {
        f.is_valid()
            && self
                .faces
                .get(f.index())
                .is_some_and(|r| r.state == Lifecycle::Live)
    }

    pub(crate) fn ensure_vertex(&self, v: VertexId<I>) -> Result<()> {
        if self.is_live_vertex(v) {
            Ok(())
        } else {
            Err(MeshError::Destroyed {
                entity: Entity::Vertex(v.index()),
            })
        }
    }

    pub(crate) fn ensure_halfedge(&self, he: HalfEdgeId<I>) -> Result<()> {
        if self.is_live_halfedge(he) {
            Ok(())
        } else {
            Err(MeshError::Destroyed {
                entity: Entity::HalfEdge(he.index()),
            })
        }
    }

    pub(crate) fn ensure_face(&self, f: FaceId<I>) -> Result<()> {
        if self.is_live_face(f) {
            Ok(())
        } else {
            Err(MeshError::Destroyed {
                entity: Entity::Face(f.index()),
            })
        }
    }

    // ==================== Topology Queries ====================

    /// The vertex a half-edge points at.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).dest
    }

    /// The vertex a half-edge starts from.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.dest(self.prev(he))
    }

    /// The next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// The previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// The opposite half-edge on the adjacent face, if linked.
    #[inline]
    pub fn sym(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.halfedge(he).sym.valid()
    }

    /// The face owning a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Check if a half-edge has no twin.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Number of sides of a face.
    pub fn degree(&self, f: FaceId<I>) -> usize {
        self.face_halfedges(f).count()
    }

    /// Orientation tag of a face.
    #[inline]
    pub fn orientation(&self, f: FaceId<I>) -> Orientation {
        self.face(f).orientation
    }

    #[inline]
    pub(crate) fn set_orientation(&mut self, f: FaceId<I>, tag: Orientation) {
        self.face_mut(f).orientation = tag;
    }

    // ==================== User Handles ====================

    /// Attach a payload handle to a vertex.
    pub fn set_vertex_user(&mut self, v: VertexId<I>, user: Option<UserHandle>) -> Result<()> {
        self.ensure_vertex(v)?;
        self.vertex_mut(v).user = user;
        Ok(())
    }

    /// Payload handle of a vertex.
    #[inline]
    pub fn vertex_user(&self, v: VertexId<I>) -> Option<UserHandle> {
        self.vertex(v).user
    }

    /// Attach a payload handle to a face.
    pub fn set_face_user(&mut self, f: FaceId<I>, user: Option<UserHandle>) -> Result<()> {
        self.ensure_face(f)?;
        self.face_mut(f).user = user;
        Ok(())
    }

    /// Payload handle of a face.
    #[inline]
    pub fn face_user(&self, f: FaceId<I>) -> Option<UserHandle> {
        self.face(f).user
    }

    // ==================== Iteration ====================

    /// Iterate over live vertex IDs in slot order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state == Lifecycle::Live)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over live half-edge IDs in slot order.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| he.state == Lifecycle::Live)
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over live face IDs in slot order.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.state == Lifecycle::Live)
            .map(|(i, _)| FaceId::new(i))
    }

    // ==================== Allocation ====================

    /// Add a new isolated vertex and return its ID.
    pub fn add_vertex(&mut self) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new());
        self.live_vertices += 1;
        id
    }

    pub(crate) fn alloc_halfedge(&mut self, he: HalfEdge<I>) -> HalfEdgeId<I> {
        let id = HalfEdgeId::new(self.halfedges.len());
        self.halfedges.push(he);
        self.live_halfedges += 1;
        id
    }

    pub(crate) fn alloc_face(&mut self, face: Face<I>) -> FaceId<I> {
        let id = FaceId::new(self.faces.len());
        self.faces.push(face);
        self.live_faces += 1;
        id
    }

    pub(crate) fn kill_vertex(&mut self, v: VertexId<I>) {
        let rec = self.vertex_mut(v);
        debug_assert_eq!(rec.state, Lifecycle::Live);
        rec.state = Lifecycle::Destroyed;
        rec.halfedge = HalfEdgeId::invalid();
        self.live_vertices -= 1;
    }

    pub(crate) fn kill_halfedge(&mut self, he: HalfEdgeId<I>) {
        let rec = self.halfedge_mut(he);
        debug_assert_eq!(rec.state, Lifecycle::Live);
        rec.state = Lifecycle::Destroyed;
        rec.sym = HalfEdgeId::invalid();
        self.live_halfedges -= 1;
    }

    pub(crate) fn kill_face(&mut self, f: FaceId<I>) {
        let rec = self.face_mut(f);
        debug_assert_eq!(rec.state, Lifecycle::Live);
        rec.state = Lifecycle::Destroyed;
        rec.halfedge = HalfEdgeId::invalid();
        self.live_faces -= 1;
    }

    /// Link two half-edges as each other's sym.
    #[inline]
    pub(crate) fn set_sym(&mut self, a: HalfEdgeId<I>, b: HalfEdgeId<I>) {
        self.halfedge_mut(a).sym = b;
        self.halfedge_mut(b).sym = a;
    }

    /// Link `a -> b` in a face loop.
    #[inline]
    pub(crate) fn link(&mut self, a: HalfEdgeId<I>, b: HalfEdgeId<I>) {
        self.halfedge_mut(a).next = b;
        self.halfedge_mut(b).prev = a;
    }

    // ==================== Validation ====================

    /// Check if the mesh satisfies every structural invariant.
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    /// Check every structural invariant, reporting the first violation as
    /// [`MeshError::InvalidStructure`].
    ///
    /// Verified: loop integrity (`next.prev == self`, `prev.next == self`,
    /// loops close after `degree ≥ 3` steps on the owning face), twin symmetry
    /// (`sym.sym == self`, `sym.dest == prev.dest`), representative edges
    /// pointing at their vertex, and that no live record references a
    /// destroyed one.
    pub fn check(&self) -> Result<()> {
        for v in self.vertex_ids() {
            let rep = self.vertex(v).halfedge;
            if rep.is_valid() {
                if !self.is_live_halfedge(rep) {
                    return Err(MeshError::invalid(format!(
                        "{:?} has dead representative {:?}",
                        v, rep
                    )));
                }
                if self.dest(rep) != v {
                    return Err(MeshError::invalid(format!(
                        "{:?} representative {:?} does not point at it",
                        v, rep
                    )));
                }
            }
        }

        for he in self.halfedge_ids() {
            let rec = self.halfedge(he);
            if !self.is_live_vertex(rec.dest) {
                return Err(MeshError::invalid(format!("{:?} points at dead {:?}", he, rec.dest)));
            }
            if !self.is_live_face(rec.face) {
                return Err(MeshError::invalid(format!("{:?} belongs to dead {:?}", he, rec.face)));
            }
            if !self.is_live_halfedge(rec.next) || !self.is_live_halfedge(rec.prev) {
                return Err(MeshError::invalid(format!("{:?} has a dead loop neighbor", he)));
            }
            if self.prev(rec.next) != he || self.next(rec.prev) != he {
                return Err(MeshError::invalid(format!("{:?} breaks next/prev symmetry", he)));
            }
            if self.face_of(rec.next) != rec.face {
                return Err(MeshError::invalid(format!(
                    "{:?} and its next lie on different faces",
                    he
                )));
            }
            if let Some(sym) = rec.sym.valid() {
                if !self.is_live_halfedge(sym) {
                    return Err(MeshError::invalid(format!("{:?} has dead sym {:?}", he, sym)));
                }
                if self.halfedge(sym).sym != he {
                    return Err(MeshError::invalid(format!(
                        "{:?} sym {:?} does not point back",
                        he, sym
                    )));
                }
                if self.dest(sym) != self.origin(he) {
                    return Err(MeshError::invalid(format!(
                        "{:?} sym {:?} has wrong endpoints",
                        he, sym
                    )));
                }
            }
        }

        let bound = self.halfedges.len();
        for f in self.face_ids() {
            let entry = self.face(f).halfedge;
            if !self.is_live_halfedge(entry) || self.face_of(entry) != f {
                return Err(MeshError::invalid(format!("{:?} has a bad entry half-edge", f)));
            }
            let mut he = entry;
            let mut degree = 0;
            loop {
                if self.face_of(he) != f {
                    return Err(MeshError::invalid(format!(
                        "{:?} loop leaves the face at {:?}",
                        f, he
                    )));
                }
                degree += 1;
                if degree > bound {
                    return Err(MeshError::invalid(format!("{:?} loop does not close", f)));
                }
                he = self.next(he);
                if he == entry {
                    break;
                }
            }
            if degree < 3 {
                return Err(MeshError::invalid(format!("{:?} has degree {}", f, degree)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_halfedges(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let v0 = mesh.add_vertex();
        let v1 = mesh.add_vertex();

        assert_eq!(mesh.num_vertices(), 2);
        assert_eq!(v0.index(), 0);
        assert_eq!(v1.index(), 1);
        assert!(mesh.vertex(v0).is_isolated());
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_destroyed_slot_is_rejected() {
        let mut mesh = HalfEdgeMesh::<u16>::new();
        let v = mesh.add_vertex();
        mesh.kill_vertex(v);

        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.vertex_slots(), 1);
        assert!(!mesh.is_live_vertex(v));
        assert!(matches!(
            mesh.ensure_vertex(v),
            Err(MeshError::Destroyed {
                entity: Entity::Vertex(0)
            })
        ));
        assert!(mesh.set_vertex_user(v, Some(UserHandle(1))).is_err());
    }

    #[test]
    fn test_check_reports_broken_twin() {
        let built = crate::mesh::build_mesh::<u32, _, u32>(
            &[vec![0, 1, 2], vec![2, 1, 3]],
            &crate::mesh::BuildOptions::default(),
        )
        .unwrap();
        let mut mesh = built.mesh;
        assert!(mesh.check().is_ok());

        // One-sided sym link.
        let a = HalfEdgeId::new(0);
        let b = HalfEdgeId::new(3);
        mesh.halfedge_mut(a).sym = b;
        match mesh.check() {
            Err(MeshError::InvalidStructure { reason }) => {
                assert!(reason.contains("does not point back"), "{reason}");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!mesh.is_valid());
    }

    #[test]
    fn test_user_handles() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let v = mesh.add_vertex();
        assert_eq!(mesh.vertex_user(v), None);
        mesh.set_vertex_user(v, Some(UserHandle(17))).unwrap();
        assert_eq!(mesh.vertex_user(v), Some(UserHandle(17)));
    }

    #[test]
    fn test_orientation_inverted() {
        assert_eq!(Orientation::Accepted.inverted(), Orientation::Flipped);
        assert_eq!(Orientation::Flipped.inverted(), Orientation::Accepted);
        assert_eq!(Orientation::Unprocessed.inverted(), Orientation::Unprocessed);
    }
}
