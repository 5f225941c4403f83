//! Orientation propagation.
//!
//! Faces declared independently may disagree about winding. Propagation
//! walks the face-adjacency graph breadth-first from a seed face in each
//! connected component, tagging the seed [`Orientation::Accepted`] and every
//! other face relative to it: a neighbor that runs the shared edge in the
//! opposite direction keeps the current tag, one that runs it in the same
//! direction gets the inverted tag. A neighbor reached with two different
//! tags proves the component non-orientable (a Möbius strip, for example),
//! and the whole propagation fails naming both faces.
//!
//! Neighbors are found through `sym` where twins are linked and through an
//! [`EdgeMatchIndex`] otherwise, so propagation works on freshly built,
//! unlinked meshes. Runs in time linear in the number of half-edges.
//!
//! # Example
//!
//! ```
//! use meshtopo::algo::orient::orient_and_link;
//! use meshtopo::mesh::{build_mesh, BuildOptions, BuiltMesh, Orientation};
//!
//! // The second face runs the shared edge 1 -> 2 the same way as the first.
//! let faces = vec![[0, 1, 2], [1, 2, 3]];
//! let BuiltMesh { mut mesh, .. }: BuiltMesh<i32> =
//!     build_mesh(&faces, &BuildOptions::default()).unwrap();
//!
//! let tags = orient_and_link(&mut mesh).unwrap();
//! assert_eq!(tags.flipped().count(), 1);
//! assert!(mesh.is_valid());
//! assert!(mesh.face_ids().all(|f| mesh.orientation(f) == Orientation::Accepted));
//! ```

use std::collections::VecDeque;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeMatchIndex, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, Orientation};

/// Per-face result of [`propagate_orientation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationTags<I: MeshIndex = u32> {
    tags: Vec<Orientation>,
    components: usize,
    _marker: std::marker::PhantomData<I>,
}

impl<I: MeshIndex> OrientationTags<I> {
    /// Tag of a face. Destroyed or unknown faces read as `Unprocessed`.
    #[inline]
    pub fn get(&self, f: FaceId<I>) -> Orientation {
        self.tags.get(f.index()).copied().unwrap_or_default()
    }

    /// Faces tagged [`Orientation::Flipped`].
    pub fn flipped(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.with_tag(Orientation::Flipped)
    }

    /// Faces tagged [`Orientation::Accepted`].
    pub fn accepted(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.with_tag(Orientation::Accepted)
    }

    fn with_tag(&self, tag: Orientation) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.tags
            .iter()
            .enumerate()
            .filter(move |&(_, &t)| t == tag)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Number of connected components seeded.
    pub fn components(&self) -> usize {
        self.components
    }
}

/// Propagate a consistent orientation over the mesh.
///
/// Builds an [`EdgeMatchIndex`] first; fails with
/// [`MeshError::NonManifoldEdge`] if an edge has more than two faces.
/// See [`propagate_orientation_with`].
pub fn propagate_orientation<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<OrientationTags<I>> {
    let index = EdgeMatchIndex::from_mesh(mesh)?;
    propagate_orientation_with(mesh, &index)
}

/// Propagate a consistent orientation using a prebuilt index.
///
/// On success the tags are also written to the faces and can be read back
/// with [`HalfEdgeMesh::orientation`]. On failure every face is left
/// `Unprocessed`; the topology is never touched.
pub fn propagate_orientation_with<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    index: &EdgeMatchIndex<I>,
) -> Result<OrientationTags<I>> {
    let faces: Vec<FaceId<I>> = mesh.face_ids().collect();
    for &f in &faces {
        mesh.set_orientation(f, Orientation::Unprocessed);
    }

    let mut tags = vec![Orientation::Unprocessed; mesh.face_slots()];
    let mut queue: VecDeque<FaceId<I>> = VecDeque::with_capacity(faces.len());
    let mut components = 0;

    for &seed in &faces {
        if tags[seed.index()] != Orientation::Unprocessed {
            continue;
        }
        components += 1;
        log::info!("processing component {}", components);

        tags[seed.index()] = Orientation::Accepted;
        queue.push_back(seed);

        while let Some(f) = queue.pop_front() {
            let tag = tags[f.index()];
            for he in mesh.face_halfedges(f) {
                let Some(other) = neighbor(mesh, index, he) else {
                    continue;
                };
                let g = mesh.face_of(other);
                if g == f {
                    continue;
                }

                let implied = if mesh.dest(other) == mesh.dest(he) {
                    tag.inverted()
                } else {
                    tag
                };
                match tags[g.index()] {
                    Orientation::Unprocessed => {
                        tags[g.index()] = implied;
                        queue.push_back(g);
                    }
                    existing if existing == implied => {}
                    _ => {
                        log::debug!("orientation conflict between {:?} and {:?}", f, g);
                        return Err(MeshError::NonOrientable {
                            f1: f.index(),
                            f2: g.index(),
                        });
                    }
                }
            }
        }
    }

    for &f in &faces {
        mesh.set_orientation(f, tags[f.index()]);
    }

    let result = OrientationTags {
        tags,
        components,
        _marker: std::marker::PhantomData,
    };
    log::debug!(
        "orientation: {} components, {} faces flipped",
        components,
        result.flipped().count()
    );
    Ok(result)
}

fn neighbor<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    index: &EdgeMatchIndex<I>,
    he: HalfEdgeId<I>,
) -> Option<HalfEdgeId<I>> {
    mesh.sym(he)
        .or_else(|| index.mate(mesh, he).map(|o| o.halfedge))
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Reverse the loop of every face tagged `Flipped`.
    ///
    /// Reversed faces are retagged `Accepted`, since they now agree with
    /// their component's seed. Twinned faces must carry the same tag;
    /// otherwise nothing is reversed and [`MeshError::NonOrientable`] names
    /// the disagreeing pair. Returns the number of faces reversed.
    pub fn apply_orientation(&mut self, tags: &OrientationTags<I>) -> Result<usize> {
        let flipped: Vec<FaceId<I>> = tags.flipped().filter(|&f| self.is_live_face(f)).collect();

        for &f in &flipped {
            for he in self.face_halfedges(f) {
                if let Some(s) = self.sym(he) {
                    let g = self.face_of(s);
                    if tags.get(g) != Orientation::Flipped {
                        return Err(MeshError::NonOrientable {
                            f1: f.index(),
                            f2: g.index(),
                        });
                    }
                }
            }
        }

        for &f in &flipped {
            self.reverse_loop(f);
            self.set_orientation(f, Orientation::Accepted);
        }
        if !flipped.is_empty() {
            log::debug!("reversed {} faces", flipped.len());
        }
        Ok(flipped.len())
    }

    /// Reverse a face loop in place. Half-edge `h` keeps its identity but now
    /// points at the vertex it used to leave from.
    fn reverse_loop(&mut self, f: FaceId<I>) {
        let loop_edges: Vec<HalfEdgeId<I>> = self.face_halfedges(f).collect();
        let origins: Vec<_> = loop_edges.iter().map(|&he| self.origin(he)).collect();

        for (&he, &o) in loop_edges.iter().zip(&origins) {
            let d = self.dest(he);
            let successor = self.next(he);
            if self.vertex(d).halfedge == he {
                self.vertex_mut(d).halfedge = successor;
            }

            let rec = self.halfedge_mut(he);
            rec.dest = o;
            std::mem::swap(&mut rec.next, &mut rec.prev);
        }
    }
}

/// Orient the mesh and stitch it: index, propagate, reverse flipped loops,
/// then link every matched edge pair as twins.
///
/// Afterwards every face winds consistently with its component's seed and
/// every interior edge is twinned. Returns the tags as propagated, which
/// describe the declared winding: faces tagged `Flipped` have already been
/// reversed and now store `Accepted`. Write the result with the stored tags
/// (see [`write_mesh`](crate::io::write_mesh)), not with the returned ones.
pub fn orient_and_link<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<OrientationTags<I>> {
    let index = EdgeMatchIndex::from_mesh(mesh)?;
    let tags = propagate_orientation_with(mesh, &index)?;
    mesh.apply_orientation(&tags)?;
    mesh.link_twins(&index);
    Ok(tags)
}
