//! Euler operators.
//!
//! Local topology edits on a [`HalfEdgeMesh`]. Every operator checks all of
//! its preconditions before touching the mesh, so a failed call leaves the
//! mesh exactly as it was. On success the loop, twin and representative-edge
//! invariants hold again before the operator returns.
//!
//! | operator | creates | destroys |
//! |---|---|---|
//! | [`split_face`](HalfEdgeMesh::split_face) | 1 face, 2 half-edges | |
//! | [`join_face`](HalfEdgeMesh::join_face) | | 1 face, 2 half-edges |
//! | [`add_vertex_edge`](HalfEdgeMesh::add_vertex_edge) | 1 vertex, 1 or 2 half-edges | |
//! | [`collapse_edge`](HalfEdgeMesh::collapse_edge) | | 1 vertex, up to 2 faces, the edge's half-edges |

use std::collections::{HashMap, HashSet};

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{Entity, MeshError, Result};

/// Faces produced by [`HalfEdgeMesh::split_face`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSplit<I: MeshIndex = u32> {
    /// The original face, now bounded by the `v1 → v2` side of the cut.
    pub face: FaceId<I>,
    /// The new face, bounded by the `v2 → v1` side of the cut.
    pub new_face: FaceId<I>,
    /// The new half-edge `v1 → v2` on `face`. Its sym lies on `new_face`.
    pub halfedge: HalfEdgeId<I>,
}

/// Whether edges on the mesh boundary may be collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Fail with [`MeshError::BoundaryCollapse`].
    #[default]
    Reject,
    /// Collapse boundary edges when the link condition holds.
    Allow,
}

/// Options for [`HalfEdgeMesh::collapse_edge_with`].
#[derive(Debug, Clone, Default)]
pub struct CollapseOptions {
    /// Handling of edges with a single incident face.
    pub boundary: BoundaryPolicy,
}

impl CollapseOptions {
    /// Set the boundary policy.
    pub fn with_boundary(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary = policy;
        self
    }
}

/// Everything incident to one vertex, gathered by a scan of the half-edge
/// arena so that it does not depend on twins being linked.
struct Star<I: MeshIndex> {
    /// Neighbor vertex -> number of half-edges on the edge to it.
    neighbors: HashMap<VertexId<I>, usize>,
    faces: HashSet<FaceId<I>>,
    incoming: Vec<HalfEdgeId<I>>,
}

impl<I: MeshIndex> Star<I> {
    fn is_boundary(&self) -> bool {
        self.neighbors.values().any(|&n| n == 1)
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    fn star(&self, v: VertexId<I>) -> Star<I> {
        let mut star = Star {
            neighbors: HashMap::new(),
            faces: HashSet::new(),
            incoming: Vec::new(),
        };
        for he in self.halfedge_ids() {
            let (a, b) = (self.origin(he), self.dest(he));
            if b == v {
                *star.neighbors.entry(a).or_insert(0) += 1;
                star.faces.insert(self.face_of(he));
                star.incoming.push(he);
            } else if a == v {
                *star.neighbors.entry(b).or_insert(0) += 1;
            }
        }
        star
    }

    /// Point every listed vertex whose representative went stale at a live
    /// incoming half-edge, or mark it isolated.
    fn repair_representatives(&mut self, vertices: &[VertexId<I>]) {
        let mut pending: HashSet<VertexId<I>> = vertices
            .iter()
            .copied()
            .filter(|&v| self.is_live_vertex(v))
            .filter(|&v| {
                let rep = self.vertex(v).halfedge;
                !self.is_live_halfedge(rep) || self.dest(rep) != v
            })
            .collect();
        if pending.is_empty() {
            return;
        }

        let candidates: Vec<HalfEdgeId<I>> = self.halfedge_ids().collect();
        for he in candidates {
            let d = self.dest(he);
            if pending.remove(&d) {
                self.vertex_mut(d).halfedge = he;
                if pending.is_empty() {
                    return;
                }
            }
        }
        for v in pending {
            self.vertex_mut(v).halfedge = HalfEdgeId::invalid();
        }
    }

    // ==================== SplitFace / JoinFace ====================

    /// Cut `face` in two along a new edge from `v1` to `v2`.
    ///
    /// Both vertices must lie on the face and must not be neighbors on it.
    /// The new face inherits the orientation tag of the original.
    ///
    /// # Errors
    /// - [`MeshError::DegenerateSplit`] if `v1 == v2` or they are joined by a
    ///   side of the face
    /// - [`MeshError::NotOnFace`] if either vertex is not on the face
    pub fn split_face(
        &mut self,
        face: FaceId<I>,
        v1: VertexId<I>,
        v2: VertexId<I>,
    ) -> Result<FaceSplit<I>> {
        self.ensure_face(face)?;
        let degenerate = MeshError::DegenerateSplit {
            face: face.index(),
            v1: v1.index(),
            v2: v2.index(),
        };
        if v1 == v2 {
            return Err(degenerate);
        }

        let on_face = |v: VertexId<I>| {
            self.face_halfedges(face)
                .find(|&he| self.dest(he) == v)
                .ok_or(MeshError::NotOnFace {
                    face: face.index(),
                    vertex: v.index(),
                })
        };
        let e1 = on_face(v1)?;
        let e2 = on_face(v2)?;

        let n1 = self.next(e1);
        let n2 = self.next(e2);
        if self.dest(n1) == v2 || self.dest(n2) == v1 {
            return Err(degenerate);
        }

        let mut created = Face::new(HalfEdgeId::invalid());
        created.orientation = self.face(face).orientation;
        let new_face = self.alloc_face(created);

        let a = self.alloc_halfedge(HalfEdge {
            dest: v2,
            face,
            ..HalfEdge::new()
        });
        let b = self.alloc_halfedge(HalfEdge {
            dest: v1,
            face: new_face,
            ..HalfEdge::new()
        });
        self.set_sym(a, b);

        self.link(e1, a);
        self.link(a, n2);
        self.link(e2, b);
        self.link(b, n1);

        self.face_mut(face).halfedge = a;
        self.face_mut(new_face).halfedge = b;

        let moved: Vec<HalfEdgeId<I>> = self.face_halfedges(new_face).collect();
        for he in moved {
            self.halfedge_mut(he).face = new_face;
        }

        log::debug!("split {:?} into {:?} and {:?}", face, face, new_face);
        Ok(FaceSplit {
            face,
            new_face,
            halfedge: a,
        })
    }

    /// Merge two faces by removing the edge they share.
    ///
    /// `shared` may be either half-edge of the common edge. `f1` survives and
    /// is returned; `f2` and the edge's two half-edges are destroyed.
    ///
    /// # Errors
    /// - [`MeshError::NotAdjacent`] if `shared` is not a twinned edge between
    ///   `f1` and `f2`
    /// - [`MeshError::DegenerateJoin`] if the faces also meet somewhere other
    ///   than the shared edge, which would make the merged loop touch itself
    pub fn join_face(
        &mut self,
        f1: FaceId<I>,
        f2: FaceId<I>,
        shared: HalfEdgeId<I>,
    ) -> Result<FaceId<I>> {
        self.ensure_face(f1)?;
        self.ensure_face(f2)?;
        self.ensure_halfedge(shared)?;

        let not_adjacent = MeshError::NotAdjacent {
            f1: f1.index(),
            f2: f2.index(),
        };
        if f1 == f2 {
            return Err(not_adjacent);
        }
        let Some(other) = self.sym(shared) else {
            return Err(not_adjacent);
        };
        let (e, s) = match (self.face_of(shared), self.face_of(other)) {
            (a, b) if a == f1 && b == f2 => (shared, other),
            (a, b) if a == f2 && b == f1 => (other, shared),
            _ => return Err(not_adjacent),
        };

        let verts1: HashSet<VertexId<I>> = self.face_vertices(f1).collect();
        let common = self.face_vertices(f2).filter(|v| verts1.contains(v)).count();
        if common != 2 {
            return Err(MeshError::DegenerateJoin {
                f1: f1.index(),
                f2: f2.index(),
            });
        }

        let (ep, en) = (self.prev(e), self.next(e));
        let (sp, sn) = (self.prev(s), self.next(s));
        let u = self.dest(ep);
        let v = self.dest(e);

        let moved: Vec<HalfEdgeId<I>> = self.face_halfedges(f2).filter(|&he| he != s).collect();

        self.link(ep, sn);
        self.link(sp, en);
        for he in moved {
            self.halfedge_mut(he).face = f1;
        }
        self.face_mut(f1).halfedge = en;

        if self.vertex(v).halfedge == e {
            self.vertex_mut(v).halfedge = sp;
        }
        if self.vertex(u).halfedge == s {
            self.vertex_mut(u).halfedge = ep;
        }

        self.kill_halfedge(e);
        self.kill_halfedge(s);
        self.kill_face(f2);

        log::debug!("joined {:?} into {:?}", f2, f1);
        Ok(f1)
    }

    // ==================== AddVertexEdge ====================

    /// Subdivide the edge of `he` (and its sym, if linked) with a new vertex.
    ///
    /// `he` keeps its destination and becomes the second half of the edge;
    /// the first half is a new half-edge pointing at the returned vertex. The
    /// kernel does not place the vertex; attach its position through a side
    /// table such as [`Geometry`](crate::mesh::Geometry).
    pub fn add_vertex_edge(&mut self, he: HalfEdgeId<I>) -> Result<VertexId<I>> {
        self.ensure_halfedge(he)?;

        let m = self.add_vertex();
        let h1 = self.alloc_halfedge(HalfEdge {
            dest: m,
            face: self.face_of(he),
            ..HalfEdge::new()
        });
        let p = self.prev(he);
        self.link(p, h1);
        self.link(h1, he);
        self.vertex_mut(m).halfedge = h1;

        if let Some(s) = self.sym(he) {
            let t = self.alloc_halfedge(HalfEdge {
                dest: m,
                face: self.face_of(s),
                ..HalfEdge::new()
            });
            let ps = self.prev(s);
            self.link(ps, t);
            self.link(t, s);

            self.set_sym(he, t);
            self.set_sym(h1, s);
        }

        Ok(m)
    }

    // ==================== CollapseEdge ====================

    /// Merge `v2` into `v1` with the default [`CollapseOptions`].
    pub fn collapse_edge(&mut self, v1: VertexId<I>, v2: VertexId<I>) -> Result<VertexId<I>> {
        self.collapse_edge_with(v1, v2, &CollapseOptions::default())
    }

    /// Merge `v2` into `v1`, removing the edge between them.
    ///
    /// Triangles on the edge degenerate to two-sided loops and are removed,
    /// their remaining two edges fused into one. Larger faces just lose a
    /// side. Returns the surviving vertex `v1`.
    ///
    /// # Errors
    /// - [`MeshError::NotConnected`] if no edge joins the vertices
    /// - [`MeshError::NonManifoldEdge`] if more than two faces use the edge
    /// - [`MeshError::BoundaryCollapse`] for a boundary edge under
    ///   [`BoundaryPolicy::Reject`]
    /// - [`MeshError::WouldDisconnect`] if the link condition fails: the
    ///   endpoints share a neighbor that is not the third vertex of a
    ///   triangle on the edge, share a face not on the edge, or are both on
    ///   the boundary while the edge is not
    pub fn collapse_edge_with(
        &mut self,
        v1: VertexId<I>,
        v2: VertexId<I>,
        options: &CollapseOptions,
    ) -> Result<VertexId<I>> {
        self.ensure_vertex(v1)?;
        self.ensure_vertex(v2)?;

        let not_connected = MeshError::NotConnected {
            v0: v1.index(),
            v1: v2.index(),
        };
        if v1 == v2 {
            return Err(not_connected);
        }

        let star1 = self.star(v1);
        let star2 = self.star(v2);

        let multiplicity = star1.neighbors.get(&v2).copied().unwrap_or(0);
        if multiplicity == 0 {
            return Err(not_connected);
        }
        if multiplicity > 2 {
            return Err(MeshError::non_manifold(v1.index(), v2.index()));
        }

        let boundary_edge = multiplicity == 1;
        if boundary_edge && options.boundary == BoundaryPolicy::Reject {
            return Err(MeshError::BoundaryCollapse {
                v0: v1.index(),
                v1: v2.index(),
            });
        }

        let would_disconnect = MeshError::WouldDisconnect {
            v0: v1.index(),
            v1: v2.index(),
        };
        if !boundary_edge && star1.is_boundary() && star2.is_boundary() {
            return Err(would_disconnect);
        }

        let edge: Vec<HalfEdgeId<I>> = star1
            .incoming
            .iter()
            .chain(&star2.incoming)
            .copied()
            .filter(|&he| {
                let (a, b) = (self.origin(he), self.dest(he));
                (a == v1 && b == v2) || (a == v2 && b == v1)
            })
            .collect();

        let edge_faces: HashSet<FaceId<I>> = edge.iter().map(|&he| self.face_of(he)).collect();
        let shared_faces: HashSet<FaceId<I>> =
            star1.faces.intersection(&star2.faces).copied().collect();
        if shared_faces != edge_faces {
            return Err(would_disconnect);
        }

        let apexes: HashSet<VertexId<I>> = edge
            .iter()
            .filter(|&&he| self.degree(self.face_of(he)) == 3)
            .map(|&he| self.dest(self.next(he)))
            .collect();
        let common: HashSet<VertexId<I>> = star1
            .neighbors
            .keys()
            .filter(|n| **n != v2 && star2.neighbors.contains_key(n))
            .copied()
            .collect();
        if common != apexes {
            return Err(would_disconnect);
        }

        // Preconditions hold; mutate.
        for &he in &edge {
            let f = self.face_of(he);
            let (p, n) = (self.prev(he), self.next(he));
            self.link(p, n);
            if self.face(f).halfedge == he {
                self.face_mut(f).halfedge = n;
            }
            if let Some(s) = self.sym(he) {
                if !edge.contains(&s) {
                    self.halfedge_mut(s).sym = HalfEdgeId::invalid();
                }
            }
        }
        for &he in &edge {
            self.kill_halfedge(he);
        }

        for &he in &star2.incoming {
            if self.is_live_halfedge(he) {
                self.halfedge_mut(he).dest = v1;
            }
        }

        let mut removed_faces = 0;
        for &f in &edge_faces {
            if self.degree(f) != 2 {
                continue;
            }
            let p = self.face(f).halfedge;
            let n = self.next(p);
            match (self.sym(p), self.sym(n)) {
                (Some(a), Some(b)) => self.set_sym(a, b),
                (Some(a), None) => self.halfedge_mut(a).sym = HalfEdgeId::invalid(),
                (None, Some(b)) => self.halfedge_mut(b).sym = HalfEdgeId::invalid(),
                (None, None) => {}
            }
            self.kill_halfedge(p);
            self.kill_halfedge(n);
            self.kill_face(f);
            removed_faces += 1;
        }

        self.kill_vertex(v2);

        let mut affected: Vec<VertexId<I>> = vec![v1];
        affected.extend(apexes.iter().copied());
        self.repair_representatives(&affected);

        log::debug!(
            "collapsed {:?} into {:?}, removed {} faces",
            v2,
            v1,
            removed_faces
        );
        Ok(v1)
    }

    // ==================== Destroy ====================

    /// Destroy an isolated vertex.
    ///
    /// Fails with [`MeshError::StillReferenced`] if any half-edge still
    /// points at it.
    pub fn destroy_vertex(&mut self, v: VertexId<I>) -> Result<()> {
        self.ensure_vertex(v)?;
        let referenced =
            self.vertex(v).halfedge.is_valid() || self.halfedge_ids().any(|he| self.dest(he) == v);
        if referenced {
            return Err(MeshError::StillReferenced {
                entity: Entity::Vertex(v.index()),
            });
        }
        self.kill_vertex(v);
        Ok(())
    }

    /// Destroy a half-edge that nothing references any more.
    ///
    /// Face loops own their half-edges and [`destroy_face`](Self::destroy_face)
    /// removes them with the face, so a half-edge of a well-formed mesh is
    /// always referenced.
    ///
    /// # Errors
    /// - [`MeshError::StillReferenced`] while the half-edge has a twin, lies
    ///   on a live face's loop or is the representative of a vertex
    /// - [`MeshError::Destroyed`] if it is already gone
    pub fn destroy_edge(&mut self, he: HalfEdgeId<I>) -> Result<()> {
        self.ensure_halfedge(he)?;
        let f = self.face_of(he);
        let referenced = self.sym(he).is_some()
            || (self.is_live_face(f) && self.face_halfedges(f).any(|h| h == he))
            || self.vertex_ids().any(|v| self.vertex(v).halfedge == he);
        if referenced {
            return Err(MeshError::StillReferenced {
                entity: Entity::HalfEdge(he.index()),
            });
        }
        self.kill_halfedge(he);
        Ok(())
    }

    /// Break the twin link of `he`, leaving both half-edges on the boundary.
    ///
    /// The two faces stay and keep their loops. Returns the former twin, or
    /// `None` if `he` was already on the boundary.
    pub fn unlink_sym(&mut self, he: HalfEdgeId<I>) -> Result<Option<HalfEdgeId<I>>> {
        self.ensure_halfedge(he)?;
        let Some(s) = self.sym(he) else {
            return Ok(None);
        };
        self.halfedge_mut(he).sym = HalfEdgeId::invalid();
        self.halfedge_mut(s).sym = HalfEdgeId::invalid();
        log::debug!("unlinked {:?} from {:?}", he, s);
        Ok(Some(s))
    }

    /// Destroy a face together with its half-edge loop.
    ///
    /// Vertices left without incident half-edges become isolated; they are
    /// not destroyed. Fails with [`MeshError::StillReferenced`] while any of
    /// the face's half-edges is still twinned with a neighbor; detach those
    /// edges with [`unlink_sym`](Self::unlink_sym) first.
    pub fn destroy_face(&mut self, f: FaceId<I>) -> Result<()> {
        self.ensure_face(f)?;
        let loop_edges: Vec<HalfEdgeId<I>> = self.face_halfedges(f).collect();
        if loop_edges.iter().any(|&he| self.sym(he).is_some()) {
            return Err(MeshError::StillReferenced {
                entity: Entity::Face(f.index()),
            });
        }

        let vertices: Vec<VertexId<I>> = loop_edges.iter().map(|&he| self.dest(he)).collect();
        for he in loop_edges {
            self.kill_halfedge(he);
        }
        self.kill_face(f);
        self.repair_representatives(&vertices);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::mesh::{build_mesh, BuildOptions, BuiltMesh, EdgeMatchIndex};

    /// Build and link twins; the fixtures are consistently wound.
    fn linked(faces: &[Vec<u32>]) -> BuiltMesh<u32> {
        let mut built: BuiltMesh<u32> = build_mesh(faces, &BuildOptions::default()).unwrap();
        let index = EdgeMatchIndex::from_mesh(&built.mesh).unwrap();
        built.mesh.link_twins(&index);
        assert!(built.mesh.is_valid());
        built
    }

    fn vid(built: &BuiltMesh<u32>, key: u32) -> VertexId {
        built.keys.get(&key).unwrap()
    }

    /// Cyclic sequence equality up to rotation.
    fn same_cycle(a: &[VertexId], b: &[VertexId]) -> bool {
        a.len() == b.len()
            && (0..a.len()).any(|r| (0..a.len()).all(|i| a[(i + r) % a.len()] == b[i]))
    }

    fn tetrahedron() -> Vec<Vec<u32>> {
        vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![2, 0, 3]]
    }

    fn octahedron() -> Vec<Vec<u32>> {
        // Poles 0 (top) and 5 (bottom), equator 1..4.
        vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![0, 3, 4],
            vec![0, 4, 1],
            vec![5, 2, 1],
            vec![5, 3, 2],
            vec![5, 4, 3],
            vec![5, 1, 4],
        ]
    }

    fn grid(n: u32) -> Vec<Vec<u32>> {
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + n + 1;
                let v11 = v01 + 1;
                faces.push(vec![v00, v10, v11]);
                faces.push(vec![v00, v11, v01]);
            }
        }
        faces
    }

    #[test]
    fn test_split_face_quad() {
        let mut built = linked(&[vec![0, 1, 2, 3]]);
        let f = built.mesh.face_ids().next().unwrap();
        let (v0, v2) = (vid(&built, 0), vid(&built, 2));

        let split = built.mesh.split_face(f, v0, v2).unwrap();
        let mesh = &built.mesh;
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.degree(split.face), 3);
        assert_eq!(mesh.degree(split.new_face), 3);
        assert_eq!(mesh.origin(split.halfedge), v0);
        assert_eq!(mesh.dest(split.halfedge), v2);

        let twin = mesh.sym(split.halfedge).unwrap();
        assert_eq!(mesh.face_of(twin), split.new_face);
        assert_eq!(mesh.sym(twin), Some(split.halfedge));
    }

    #[test]
    fn test_split_then_join_restores_cycle() {
        let mut built = linked(&[vec![0, 1, 2, 3, 4, 5]]);
        let f = built.mesh.face_ids().next().unwrap();
        let original: Vec<_> = built.mesh.face_vertices(f).collect();
        let (v1, v4) = (vid(&built, 1), vid(&built, 4));

        let split = built.mesh.split_face(f, v1, v4).unwrap();
        assert_eq!(built.mesh.degree(split.face) + built.mesh.degree(split.new_face), 8);

        let joined = built
            .mesh
            .join_face(split.face, split.new_face, split.halfedge)
            .unwrap();
        assert!(built.mesh.is_valid());
        assert_eq!(built.mesh.num_faces(), 1);
        assert_eq!(built.mesh.num_halfedges(), 6);

        let restored: Vec<_> = built.mesh.face_vertices(joined).collect();
        assert!(same_cycle(&original, &restored));
    }

    #[test]
    fn test_split_face_errors_leave_mesh_unchanged() {
        let mut built = linked(&[vec![0, 1, 2, 3], vec![4, 5, 6]]);
        let f = built.mesh.face_ids().next().unwrap();
        let (v0, v1, v4) = (vid(&built, 0), vid(&built, 1), vid(&built, 4));
        let before = crate::mesh::to_face_list(&built.mesh);

        assert!(matches!(
            built.mesh.split_face(f, v0, v0),
            Err(MeshError::DegenerateSplit { .. })
        ));
        assert!(matches!(
            built.mesh.split_face(f, v0, v1),
            Err(MeshError::DegenerateSplit { .. })
        ));
        assert!(matches!(
            built.mesh.split_face(f, v0, v4),
            Err(MeshError::NotOnFace { .. })
        ));

        assert_eq!(crate::mesh::to_face_list(&built.mesh), before);
        assert_eq!(built.mesh.face_slots(), 2);
        assert_eq!(built.mesh.halfedge_slots(), 7);
    }

    #[test]
    fn test_join_face_errors() {
        let mut built = linked(&[vec![0, 1, 2], vec![2, 1, 3], vec![4, 5, 6]]);
        let f: Vec<_> = built.mesh.face_ids().collect();
        let (v1, v2) = (vid(&built, 1), vid(&built, 2));
        let shared = built.mesh.find_halfedge(v1, v2).unwrap();

        assert!(matches!(
            built.mesh.join_face(f[0], f[2], shared),
            Err(MeshError::NotAdjacent { .. })
        ));
        let boundary = built.mesh.next(shared);
        assert!(matches!(
            built.mesh.join_face(f[0], f[1], boundary),
            Err(MeshError::NotAdjacent { .. })
        ));
        assert!(matches!(
            built.mesh.join_face(f[0], f[0], shared),
            Err(MeshError::NotAdjacent { .. })
        ));

        // Either half-edge of the shared edge works, in either face order.
        let twin = built.mesh.sym(shared).unwrap();
        let merged = built.mesh.join_face(f[1], f[0], twin).unwrap();
        assert_eq!(merged, f[1]);
        assert_eq!(built.mesh.degree(merged), 4);
        assert!(!built.mesh.is_live_face(f[0]));
        assert!(built.mesh.is_valid());
    }

    #[test]
    fn test_join_rejects_faces_meeting_twice() {
        // Faces share edge (1,2) and also vertex 0.
        let mut built = linked(&[vec![0, 1, 2, 3], vec![2, 1, 4, 0, 5]]);
        let f: Vec<_> = built.mesh.face_ids().collect();
        let shared = built
            .mesh
            .find_halfedge(vid(&built, 1), vid(&built, 2))
            .unwrap();
        assert!(matches!(
            built.mesh.join_face(f[0], f[1], shared),
            Err(MeshError::DegenerateJoin { .. })
        ));
        assert!(built.mesh.is_valid());
    }

    #[test]
    fn test_add_vertex_edge_interior() {
        let mut built = linked(&[vec![0, 1, 2], vec![2, 1, 3]]);
        let (v1, v2) = (vid(&built, 1), vid(&built, 2));
        let he = built.mesh.find_halfedge(v1, v2).unwrap();

        let m = built.mesh.add_vertex_edge(he).unwrap();
        let mesh = &built.mesh;
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_halfedges(), 8);
        assert_eq!(mesh.origin(he), m);
        assert_eq!(mesh.dest(he), v2);

        let f: Vec<_> = mesh.face_ids().collect();
        assert_eq!(mesh.degree(f[0]), 4);
        assert_eq!(mesh.degree(f[1]), 4);
        assert!(mesh.find_halfedge(v1, m).is_some());
        assert!(mesh.find_halfedge(m, v1).is_some());
        assert!(mesh.find_halfedge(v2, m).is_some());
        assert_eq!(mesh.vertex_faces(m).count(), 2);
    }

    #[test]
    fn test_add_vertex_edge_boundary() {
        let mut built = linked(&[vec![0, 1, 2]]);
        let f = built.mesh.face_ids().next().unwrap();
        let he = built.mesh.face(f).halfedge;

        let m = built.mesh.add_vertex_edge(he).unwrap();
        assert!(built.mesh.is_valid());
        assert_eq!(built.mesh.degree(f), 4);
        assert!(built.mesh.is_boundary_vertex(m));
    }

    #[test]
    fn test_add_vertex_edge_then_split_face() {
        // The 1-to-2 triangle split: subdivide an edge, cut to the apex.
        let mut built = linked(&[vec![0, 1, 2]]);
        let f = built.mesh.face_ids().next().unwrap();
        let (v0, v1, v2) = (vid(&built, 0), vid(&built, 1), vid(&built, 2));
        let he = built.mesh.find_halfedge(v0, v1).unwrap();

        let m = built.mesh.add_vertex_edge(he).unwrap();
        let split = built.mesh.split_face(f, m, v2).unwrap();
        assert!(built.mesh.is_valid());
        assert_eq!(built.mesh.num_faces(), 2);
        assert_eq!(built.mesh.degree(split.face), 3);
        assert_eq!(built.mesh.degree(split.new_face), 3);
    }

    #[test]
    fn test_collapse_interior_edge() {
        let mut built = linked(&octahedron());
        let (v0, v1) = (vid(&built, 0), vid(&built, 1));
        let faces_before = built.mesh.num_faces();

        let kept = built.mesh.collapse_edge(v0, v1).unwrap();
        let mesh = &built.mesh;
        assert_eq!(kept, v0);
        assert!(mesh.is_valid(), "{:?}", mesh.check());
        assert!(!mesh.is_live_vertex(v1));
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), faces_before - 2);
        // Euler characteristic of a sphere is preserved: V - E + F = 2.
        let edges = mesh.num_halfedges() / 2;
        assert_eq!(mesh.num_vertices() + mesh.num_faces() - edges, 2);
        assert_eq!(mesh.dest(mesh.vertex(v0).halfedge), v0);
        for f in mesh.face_ids() {
            assert!(mesh.face_vertices(f).all(|v| v != v1));
        }
        assert!(!mesh.is_boundary_vertex(v0));
    }

    #[test]
    fn test_collapse_link_condition_fails_and_preserves_mesh() {
        // Triangular bipyramid. Edge (1,2) has apexes 0 and 4, but 1 and 2
        // also share neighbor 3, so collapsing would pinch.
        let faces = vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![0, 3, 1],
            vec![1, 3, 4],
            vec![2, 1, 4],
            vec![3, 2, 4],
        ];
        let mut built = linked(&faces);
        let (v1, v2) = (vid(&built, 1), vid(&built, 2));
        let before = crate::mesh::to_face_list(&built.mesh);
        let slots = (
            built.mesh.vertex_slots(),
            built.mesh.halfedge_slots(),
            built.mesh.face_slots(),
        );

        assert!(matches!(
            built.mesh.collapse_edge(v1, v2),
            Err(MeshError::WouldDisconnect { .. })
        ));
        assert_eq!(crate::mesh::to_face_list(&built.mesh), before);
        assert_eq!(
            (
                built.mesh.vertex_slots(),
                built.mesh.halfedge_slots(),
                built.mesh.face_slots()
            ),
            slots
        );
        assert!(built.mesh.is_live_vertex(v2));
    }

    #[test]
    fn test_collapse_boundary_policy() {
        let mut built = linked(&grid(2));
        let (v0, v1) = (vid(&built, 0), vid(&built, 1));

        assert!(matches!(
            built.mesh.collapse_edge(v0, v1),
            Err(MeshError::BoundaryCollapse { .. })
        ));

        let allow = CollapseOptions::default().with_boundary(BoundaryPolicy::Allow);
        let kept = built.mesh.collapse_edge_with(v0, v1, &allow).unwrap();
        assert_eq!(kept, v0);
        assert!(built.mesh.is_valid(), "{:?}", built.mesh.check());
        assert_eq!(built.mesh.num_faces(), 7);
    }

    #[test]
    fn test_collapse_interior_edge_between_boundary_vertices() {
        // Diagonal of the first quad of a 1x1 grid joins two corners: both on
        // the boundary while the edge itself is interior.
        let mut built = linked(&grid(1));
        let (v0, v3) = (vid(&built, 0), vid(&built, 3));
        let allow = CollapseOptions::default().with_boundary(BoundaryPolicy::Allow);
        assert!(matches!(
            built.mesh.collapse_edge_with(v0, v3, &allow),
            Err(MeshError::WouldDisconnect { .. })
        ));
    }

    #[test]
    fn test_collapse_requires_edge() {
        let mut built = linked(&octahedron());
        let (v0, v5) = (vid(&built, 0), vid(&built, 5));
        assert!(matches!(
            built.mesh.collapse_edge(v0, v5),
            Err(MeshError::NotConnected { .. })
        ));
        assert!(matches!(
            built.mesh.collapse_edge(v0, v0),
            Err(MeshError::NotConnected { .. })
        ));
    }

    #[test]
    fn test_collapse_on_polygon_keeps_face() {
        // A pentagon fan: collapsing a side of the pentagon only shortens it.
        let mut built = linked(&[vec![0, 1, 2, 3, 4], vec![1, 0, 5, 6]]);
        let (v2, v3) = (vid(&built, 2), vid(&built, 3));
        let allow = CollapseOptions::default().with_boundary(BoundaryPolicy::Allow);
        built.mesh.collapse_edge_with(v2, v3, &allow).unwrap();

        let f = built.mesh.face_ids().next().unwrap();
        assert_eq!(built.mesh.degree(f), 4);
        assert_eq!(built.mesh.num_faces(), 2);
        assert!(built.mesh.is_valid());
    }

    #[test]
    fn test_tetrahedron_collapse_keeps_invariants() {
        let mut built = linked(&tetrahedron());
        let (v0, v1) = (vid(&built, 0), vid(&built, 1));
        built.mesh.collapse_edge(v0, v1).unwrap();
        assert!(built.mesh.is_valid(), "{:?}", built.mesh.check());
        assert_eq!(built.mesh.num_faces(), 2);
    }

    #[test]
    fn test_destroy_vertex_still_referenced() {
        let mut built = linked(&[vec![0, 1, 2]]);
        let v0 = vid(&built, 0);
        assert!(matches!(
            built.mesh.destroy_vertex(v0),
            Err(MeshError::StillReferenced {
                entity: Entity::Vertex(_)
            })
        ));

        let lonely = built.mesh.add_vertex();
        built.mesh.destroy_vertex(lonely).unwrap();
        assert!(!built.mesh.is_live_vertex(lonely));
        assert!(matches!(
            built.mesh.destroy_vertex(lonely),
            Err(MeshError::Destroyed { .. })
        ));
    }

    #[test]
    fn test_destroy_face_requires_detached_edges() {
        let mut built = linked(&[vec![0, 1, 2], vec![2, 1, 3]]);
        let f: Vec<_> = built.mesh.face_ids().collect();
        let (v0, v1, v2, v3) = (vid(&built, 0), vid(&built, 1), vid(&built, 2), vid(&built, 3));

        assert!(matches!(
            built.mesh.destroy_face(f[1]),
            Err(MeshError::StillReferenced {
                entity: Entity::Face(_)
            })
        ));

        let shared = built.mesh.find_halfedge(v2, v1).unwrap();
        let twin = built.mesh.sym(shared);
        assert_eq!(built.mesh.unlink_sym(shared).unwrap(), twin);
        assert_eq!(built.mesh.unlink_sym(shared).unwrap(), None);
        built.mesh.destroy_face(f[1]).unwrap();

        let mesh = &built.mesh;
        assert!(mesh.is_valid(), "{:?}", mesh.check());
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_halfedges(), 3);
        assert!(mesh.vertex(v3).is_isolated());
        for v in [v0, v1, v2] {
            assert_eq!(mesh.dest(mesh.vertex(v).halfedge), v);
        }

        built.mesh.destroy_vertex(v3).unwrap();
        assert_eq!(built.mesh.num_vertices(), 3);
    }

    #[test]
    fn test_destroy_edge_still_referenced() {
        let mut built = linked(&[vec![0, 1, 2]]);
        let f = built.mesh.face_ids().next().unwrap();
        let before = crate::mesh::to_face_list(&built.mesh);

        for he in built.mesh.face_halfedges(f).collect::<Vec<_>>() {
            let err = built.mesh.destroy_edge(he).unwrap_err();
            match err {
                MeshError::StillReferenced {
                    entity: Entity::HalfEdge(i),
                } => assert_eq!(i, he.index()),
                other => panic!("unexpected error {other:?}"),
            }
            assert!(built.mesh.is_live_halfedge(he));
        }
        assert_eq!(built.mesh.num_halfedges(), 3);
        assert_eq!(crate::mesh::to_face_list(&built.mesh), before);

        // A twin keeps the edge alive even once the faces are gone.
        let mut pair = linked(&[vec![0, 1, 2], vec![2, 1, 3]]);
        let shared = pair.mesh.find_halfedge(vid(&pair, 1), vid(&pair, 2)).unwrap();
        assert!(matches!(
            pair.mesh.destroy_edge(shared),
            Err(MeshError::StillReferenced { .. })
        ));
        assert!(pair.mesh.sym(shared).is_some());
    }

    #[test]
    fn test_destroy_edge_after_face() {
        let mut built = linked(&[vec![0, 1, 2]]);
        let f = built.mesh.face_ids().next().unwrap();
        let he = built.mesh.face(f).halfedge;

        built.mesh.destroy_face(f).unwrap();
        assert!(matches!(
            built.mesh.destroy_edge(he),
            Err(MeshError::Destroyed {
                entity: Entity::HalfEdge(_)
            })
        ));

        // A half-edge outside any loop has nothing pointing at it.
        let stray = built.mesh.alloc_halfedge(HalfEdge::new());
        assert!(!built.mesh.is_valid());
        built.mesh.destroy_edge(stray).unwrap();
        assert!(!built.mesh.is_live_halfedge(stray));
        assert_eq!(built.mesh.num_halfedges(), 0);
        assert!(built.mesh.is_valid());
    }

    #[test]
    fn test_loop_integrity_after_operator_sequence() {
        let mut built = linked(&grid(3));
        let mesh = &mut built.mesh;

        let he = mesh.halfedge_ids().find(|&he| mesh.sym(he).is_some()).unwrap();
        let m = mesh.add_vertex_edge(he).unwrap();
        let f = mesh.face_of(he);
        let apex = mesh.dest(mesh.next(he));
        let first_half = mesh.prev(he);

        mesh.split_face(f, m, apex).unwrap();
        let across = mesh.sym(first_half).unwrap();
        let g = mesh.face_of(across);
        let apex2 = mesh.dest(mesh.next(across));
        mesh.split_face(g, m, apex2).unwrap();
        assert_eq!(mesh.valence(m), 4);
        assert!(mesh.is_valid(), "{:?}", mesh.check());

        for f in mesh.face_ids().collect::<Vec<_>>() {
            let degree = mesh.degree(f);
            let start = mesh.face(f).halfedge;
            let mut he = start;
            for _ in 0..degree {
                he = mesh.next(he);
            }
            assert_eq!(he, start);
        }

        let twins: HashSet<_> = mesh.halfedge_ids().filter_map(|he| mesh.sym(he)).collect();
        for he in twins {
            let s = mesh.sym(he).unwrap();
            assert_eq!(mesh.sym(s), Some(he));
            assert_eq!(mesh.dest(s), mesh.dest(mesh.prev(he)));
        }
    }
}
