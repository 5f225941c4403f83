//! Adjacency traversal.
//!
//! Every traversal is a lazy iterator borrowing the mesh. Calling the
//! traversal method again starts over; nothing survives a mutation, and the
//! borrow checker keeps the mesh from being edited while an iterator is alive.
//!
//! Vertex traversals walk the fan of faces around a vertex through `sym`
//! links, starting from the vertex's representative half-edge. A closed fan
//! is covered by the walk alone. When the walk runs into a half-edge without
//! a twin, either on the boundary or because twins have not been linked yet
//! (see [`HalfEdgeMesh::link_twins`]), the fan is completed by a scan of the
//! half-edge arena, so freshly built meshes report every incident face.
//!
//! Bowtie vertices, where several fans touch at one point, are accepted by
//! construction. If the sheet holding the representative half-edge is closed,
//! their traversals cover that sheet only. An open sheet falls back to the
//! arena scan, which reaches every sheet.

use std::collections::HashMap;

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Iterate over the half-edges of a face, starting at its entry.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over the vertices of a face in loop order.
    ///
    /// The first vertex is the one the face's entry half-edge points at.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.dest(he))
    }

    /// Iterate over the faces across each linked edge of a face.
    pub fn face_neighbors(&self, f: FaceId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.face_halfedges(f)
            .filter_map(|he| self.sym(he).map(|s| self.face_of(s)))
    }

    /// Iterate over the half-edges pointing at a vertex, one per incident face.
    pub fn vertex_fan(&self, v: VertexId<I>) -> VertexFanIter<'_, I> {
        VertexFanIter::new(self, v)
    }

    /// Iterate over the edges incident to a vertex, one half-edge per edge.
    ///
    /// Edges are reported by a half-edge pointing at `v` where one exists.
    /// An edge whose only face around `v` leaves it, such as the last edge
    /// of an open fan, is reported by its outgoing half-edge.
    pub fn vertex_edges(&self, v: VertexId<I>) -> VertexEdgeIter<'_, I> {
        VertexEdgeIter {
            mesh: self,
            fan: self.vertex_fan(v),
            incoming: Vec::new(),
            reported: Vec::new(),
            outgoing: 0,
        }
    }

    /// Iterate over the vertices adjacent to a vertex.
    pub fn vertex_vertices(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_edges(v).map(move |he| {
            let d = self.dest(he);
            if d == v {
                self.origin(he)
            } else {
                d
            }
        })
    }

    /// Iterate over the faces incident to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_fan(v).map(|he| self.face_of(he))
    }

    /// Number of edges incident to a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_edges(v).count()
    }

    /// Check if a vertex is isolated or has an edge used by a single face.
    ///
    /// A fan closed through `sym` links is interior. Otherwise the faces
    /// around the vertex are counted per edge, which gives the same answer
    /// whether or not the twins have been linked.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true;
        }

        let mut he = start;
        for _ in 0..self.halfedge_slots() {
            match self.sym(self.next(he)) {
                None => break,
                Some(s) if s == start => return false,
                Some(s) => he = s,
            }
        }

        let mut uses: HashMap<VertexId<I>, usize> = HashMap::new();
        for he in self.vertex_fan(v) {
            *uses.entry(self.origin(he)).or_insert(0) += 1;
            *uses.entry(self.dest(self.next(he))).or_insert(0) += 1;
        }
        uses.values().any(|&n| n == 1)
    }

    /// Find the half-edge running from `v0` to `v1`, if any.
    ///
    /// Looks around `v1` first and falls back to a scan of every half-edge,
    /// so the answer does not depend on twins being linked.
    pub fn find_halfedge(&self, v0: VertexId<I>, v1: VertexId<I>) -> Option<HalfEdgeId<I>> {
        let is_match = |he: &HalfEdgeId<I>| self.dest(*he) == v1 && self.origin(*he) == v0;
        self.vertex_fan(v1)
            .find(is_match)
            .or_else(|| self.halfedge_ids().find(is_match))
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over the half-edges pointing at a vertex.
///
/// If the fan is open the walk starts at the clockwise-most incoming
/// half-edge. Once the walk stops at a half-edge without a twin, the
/// incoming half-edges it did not reach are picked up from the arena, so
/// every incident face is visited exactly once.
pub struct VertexFanIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    vertex: VertexId<I>,
    first: HalfEdgeId<I>,
    current: Option<HalfEdgeId<I>>,
    budget: usize,
    open: bool,
    /// Half-edges covered by the walk, filled when the scan starts.
    walked: Option<Vec<HalfEdgeId<I>>>,
    slot: usize,
}

impl<'a, I: MeshIndex> VertexFanIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let budget = mesh.halfedge_slots();
        let start = mesh.vertex(v).halfedge;
        let mut iter = Self {
            mesh,
            vertex: v,
            first: start,
            current: None,
            budget,
            open: false,
            walked: None,
            slot: 0,
        };
        if !start.is_valid() {
            return iter;
        }

        // Rewind: prev(sym(e)) is the incoming half-edge of the neighboring face.
        let mut first = start;
        for _ in 0..budget {
            let Some(s) = mesh.sym(first) else { break };
            let p = mesh.prev(s);
            if p == start {
                break;
            }
            first = p;
        }

        iter.first = first;
        iter.current = Some(first);
        iter
    }

    /// The half-edges the `sym` walk visits, in walk order.
    fn walk(&self) -> Vec<HalfEdgeId<I>> {
        let mut walked = vec![self.first];
        let mut he = self.first;
        while let Some(s) = self.mesh.sym(self.mesh.next(he)) {
            if s == self.first || walked.len() >= self.mesh.halfedge_slots() {
                break;
            }
            walked.push(s);
            he = s;
        }
        walked
    }

    fn scan_next(&mut self) -> Option<HalfEdgeId<I>> {
        if self.walked.is_none() {
            self.walked = Some(self.walk());
        }
        let mesh = self.mesh;
        let walked = self.walked.as_deref().unwrap_or_default();
        while self.slot < mesh.halfedge_slots() {
            let he = HalfEdgeId::new(self.slot);
            self.slot += 1;
            if mesh.is_live_halfedge(he) && mesh.dest(he) == self.vertex && !walked.contains(&he) {
                return Some(he);
            }
        }
        None
    }
}

impl<'a, I: MeshIndex> Iterator for VertexFanIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(he) = self.current else {
            return if self.open { self.scan_next() } else { None };
        };
        if self.budget == 0 {
            self.current = None;
            return None;
        }
        self.budget -= 1;

        self.current = match self.mesh.sym(self.mesh.next(he)) {
            Some(s) if s == self.first => None,
            Some(s) => Some(s),
            None => {
                self.open = true;
                None
            }
        };
        Some(he)
    }
}

/// Iterator over the edges incident to a vertex.
///
/// Edges are reported first by their incoming half-edges, then by the
/// outgoing half-edges whose edge had no incoming one around the vertex.
pub struct VertexEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    fan: VertexFanIter<'a, I>,
    incoming: Vec<HalfEdgeId<I>>,
    /// Far endpoints of the edges reported so far.
    reported: Vec<VertexId<I>>,
    outgoing: usize,
}

impl<'a, I: MeshIndex> Iterator for VertexEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        for he in self.fan.by_ref() {
            self.incoming.push(he);
            let far = self.mesh.origin(he);
            if !self.reported.contains(&far) {
                self.reported.push(far);
                return Some(he);
            }
        }

        while self.outgoing < self.incoming.len() {
            let out = self.mesh.next(self.incoming[self.outgoing]);
            self.outgoing += 1;
            let far = self.mesh.dest(out);
            if !self.reported.contains(&far) {
                self.reported.push(far);
                return Some(out);
            }
        }
        None
    }
}
