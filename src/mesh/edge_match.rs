//! Edge-match index.
//!
//! Faces built from independent loops only share vertices, not half-edges.
//! The index recovers their adjacency: it maps every undirected edge, keyed
//! by its unordered endpoint pair, to the (at most two) half-edges that run
//! along it. A third half-edge on the same edge is a non-manifold edge and is
//! reported as an error rather than resolved.
//!
//! The index never touches `sym`; [`HalfEdgeMesh::link_twins`] turns matched
//! pairs into twins once their windings agree.
//!
//! Only edge-level manifoldness is checked. Vertices whose fans touch at a
//! single point ("bowties") are accepted.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Unordered pair of vertices identifying an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey<I: MeshIndex = u32>(VertexId<I>, VertexId<I>);

impl<I: MeshIndex> EdgeKey<I> {
    /// Key for the edge between `a` and `b`, in either order.
    #[inline]
    pub fn new(a: VertexId<I>, b: VertexId<I>) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// The two endpoints, smaller handle first.
    #[inline]
    pub fn endpoints(self) -> (VertexId<I>, VertexId<I>) {
        (self.0, self.1)
    }
}

/// One half-edge registered on an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeOccurrence<I: MeshIndex = u32> {
    /// The registered half-edge.
    pub halfedge: HalfEdgeId<I>,
    /// The face owning it.
    pub face: FaceId<I>,
}

#[derive(Debug, Clone, Copy)]
struct EdgeEntry<I: MeshIndex> {
    first: EdgeOccurrence<I>,
    second: Option<EdgeOccurrence<I>>,
}

impl<I: MeshIndex> EdgeEntry<I> {
    fn contains(&self, he: HalfEdgeId<I>) -> bool {
        self.first.halfedge == he || self.second.is_some_and(|o| o.halfedge == he)
    }
}

/// Hash index pairing half-edges that run along the same undirected edge.
#[derive(Debug, Clone)]
pub struct EdgeMatchIndex<I: MeshIndex = u32> {
    entries: HashMap<EdgeKey<I>, EdgeEntry<I>>,
}

impl<I: MeshIndex> Default for EdgeMatchIndex<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> EdgeMatchIndex<I> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create an empty index sized for `edges` undirected edges.
    pub fn with_capacity(edges: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(edges),
        }
    }

    /// Index every half-edge of every live face.
    ///
    /// Fails with [`MeshError::NonManifoldEdge`] on the first undirected edge
    /// used by a third half-edge.
    pub fn from_mesh(mesh: &HalfEdgeMesh<I>) -> Result<Self> {
        let mut index = Self::with_capacity(mesh.num_halfedges() / 2 + 1);
        for f in mesh.face_ids() {
            for he in mesh.face_halfedges(f) {
                index.insert(mesh, he)?;
            }
        }
        Ok(index)
    }

    /// Register a half-edge on its undirected edge.
    ///
    /// Registering the same half-edge again is a no-op. The index is left
    /// unchanged when the insertion fails.
    pub fn insert(&mut self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Result<()> {
        mesh.ensure_halfedge(he)?;
        let (a, b) = (mesh.origin(he), mesh.dest(he));
        let occurrence = EdgeOccurrence {
            halfedge: he,
            face: mesh.face_of(he),
        };

        match self.entries.entry(EdgeKey::new(a, b)) {
            Entry::Vacant(slot) => {
                slot.insert(EdgeEntry {
                    first: occurrence,
                    second: None,
                });
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.contains(he) {
                    return Ok(());
                }
                if entry.second.is_some() {
                    return Err(MeshError::non_manifold(a.index(), b.index()));
                }
                entry.second = Some(occurrence);
                Ok(())
            }
        }
    }

    /// The other half-edge on `he`'s undirected edge, from a different face.
    pub fn mate(&self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Option<EdgeOccurrence<I>> {
        let entry = self.entries.get(&EdgeKey::new(mesh.origin(he), mesh.dest(he)))?;
        let face = mesh.face_of(he);
        std::iter::once(entry.first)
            .chain(entry.second)
            .find(|o| o.halfedge != he && o.face != face)
    }

    /// The other face sharing `he`'s undirected edge, if any.
    pub fn lookup(&self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Option<FaceId<I>> {
        self.mate(mesh, he).map(|o| o.face)
    }

    /// Occurrences registered for the edge between `a` and `b`.
    pub fn occurrences(
        &self,
        a: VertexId<I>,
        b: VertexId<I>,
    ) -> impl Iterator<Item = EdgeOccurrence<I>> + '_ {
        self.entries
            .get(&EdgeKey::new(a, b))
            .into_iter()
            .flat_map(|e| std::iter::once(e.first).chain(e.second))
    }

    /// Iterate over edges seen twice, as pairs of occurrences.
    pub fn pairs(&self) -> impl Iterator<Item = (EdgeOccurrence<I>, EdgeOccurrence<I>)> + '_ {
        self.entries
            .values()
            .filter_map(|e| e.second.map(|s| (e.first, s)))
    }

    /// Iterate over edges seen once (boundary edges).
    pub fn unmatched(&self) -> impl Iterator<Item = EdgeOccurrence<I>> + '_ {
        self.entries
            .values()
            .filter(|e| e.second.is_none())
            .map(|e| e.first)
    }

    /// Number of undirected edges in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Turn matched edge pairs into twins.
    ///
    /// A pair is linked when both half-edges are live, neither has a twin
    /// yet, and they run in opposite directions. Pairs that run the same way
    /// belong to inconsistently wound faces and are left alone; orient the
    /// mesh first (see [`crate::algo::orient`]).
    ///
    /// Returns the number of pairs linked.
    pub fn link_twins(&mut self, index: &EdgeMatchIndex<I>) -> usize {
        let mut linked = 0;
        let mut skipped = 0;
        for (a, b) in index.pairs() {
            let (a, b) = (a.halfedge, b.halfedge);
            if !self.is_live_halfedge(a) || !self.is_live_halfedge(b) {
                continue;
            }
            if self.sym(a).is_some() || self.sym(b).is_some() {
                continue;
            }
            if self.dest(a) == self.origin(b) && self.dest(b) == self.origin(a) {
                self.set_sym(a, b);
                linked += 1;
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::debug!("link_twins: {} same-direction pairs left unlinked", skipped);
        }
        log::debug!("link_twins: linked {} pairs", linked);
        linked
    }
}
