//! Mesh construction from face lists.
//!
//! A face list is a sequence of closed vertex loops, each naming its vertices
//! by an external identity (an integer from a file, a string label...).
//! Identities are interned into [`VertexId`] handles in first-seen order.
//!
//! Construction never links `sym` between faces: faces declared independently
//! stay independent until the caller pairs them through an
//! [`EdgeMatchIndex`](super::EdgeMatchIndex). That keeps duplicate and
//! non-manifold edges visible to the caller.

use std::collections::HashMap;
use std::hash::Hash;

use super::edge_match::EdgeMatchIndex;
use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// What to do with a face loop that lists a vertex twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateVertexPolicy {
    /// Fail with [`MeshError::MalformedFace`].
    #[default]
    Reject,
    /// Drop the repeated occurrence and log a warning.
    Collapse,
}

/// Options for [`build_mesh`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Handling of repeated vertices within one face loop.
    pub duplicates: DuplicateVertexPolicy,

    /// Register every edge in an [`EdgeMatchIndex`] after construction so
    /// that edges shared by three or more faces fail the build.
    pub check_manifold: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            duplicates: DuplicateVertexPolicy::Reject,
            check_manifold: true,
        }
    }
}

impl BuildOptions {
    /// Options that collapse repeated vertices instead of rejecting the face.
    pub fn lenient() -> Self {
        Self::default().with_duplicates(DuplicateVertexPolicy::Collapse)
    }

    /// Set the duplicate-vertex policy.
    pub fn with_duplicates(mut self, policy: DuplicateVertexPolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Set whether construction checks for non-manifold edges.
    pub fn with_check_manifold(mut self, check: bool) -> Self {
        self.check_manifold = check;
        self
    }
}

/// Two-way map between external vertex identities and vertex handles.
#[derive(Debug, Clone)]
pub struct VertexKeys<K, I: MeshIndex = u32> {
    ids: HashMap<K, VertexId<I>>,
    keys: HashMap<VertexId<I>, K>,
}

impl<K: Hash + Eq + Clone, I: MeshIndex> Default for VertexKeys<K, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, I: MeshIndex> VertexKeys<K, I> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    /// The vertex interned for `key`.
    pub fn get(&self, key: &K) -> Option<VertexId<I>> {
        self.ids.get(key).copied()
    }

    /// The identity of a vertex, if it has one.
    pub fn key(&self, v: VertexId<I>) -> Option<&K> {
        self.keys.get(&v)
    }

    /// Name a vertex, e.g. one created by an Euler operator.
    ///
    /// Returns the vertex previously holding `key`, if any.
    pub fn insert(&mut self, key: K, v: VertexId<I>) -> Option<VertexId<I>> {
        if let Some(old_key) = self.keys.insert(v, key.clone()) {
            self.ids.remove(&old_key);
        }
        let previous = self.ids.insert(key, v);
        if let Some(p) = previous.filter(|&p| p != v) {
            self.keys.remove(&p);
        }
        previous
    }

    /// Forget the identity of a vertex.
    pub fn remove(&mut self, v: VertexId<I>) -> Option<K> {
        let key = self.keys.remove(&v)?;
        self.ids.remove(&key);
        Some(key)
    }

    /// Number of named vertices.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if no vertex is named.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over `(identity, vertex)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, VertexId<I>)> + '_ {
        self.ids.iter().map(|(k, &v)| (k, v))
    }

    fn intern(&mut self, key: &K, mesh: &mut HalfEdgeMesh<I>) -> VertexId<I> {
        if let Some(v) = self.get(key) {
            return v;
        }
        let v = mesh.add_vertex();
        self.ids.insert(key.clone(), v);
        self.keys.insert(v, key.clone());
        v
    }
}

/// Result of [`build_mesh`]: the mesh and the identity map of its vertices.
#[derive(Debug, Clone)]
pub struct BuiltMesh<K, I: MeshIndex = u32> {
    /// The constructed mesh.
    pub mesh: HalfEdgeMesh<I>,
    /// External identity of each vertex.
    pub keys: VertexKeys<K, I>,
}

/// Build a half-edge mesh from a list of face loops.
///
/// Each face is a cyclic sequence of at least three external vertex
/// identities. Faces become live in input order, so face `i` of the input is
/// `FaceId::new(i)`.
///
/// # Example
/// ```
/// use meshtopo::mesh::{build_mesh, BuildOptions, BuiltMesh};
///
/// let faces = vec![vec!["a", "b", "c"], vec!["c", "b", "d"]];
/// let built: BuiltMesh<&str> = build_mesh(&faces, &BuildOptions::default()).unwrap();
/// assert_eq!(built.mesh.num_vertices(), 4);
/// assert_eq!(built.mesh.num_faces(), 2);
/// assert_eq!(built.mesh.num_halfedges(), 6);
/// ```
pub fn build_mesh<K, F, I>(faces: &[F], options: &BuildOptions) -> Result<BuiltMesh<K, I>>
where
    K: Hash + Eq + Clone,
    F: AsRef<[K]>,
    I: MeshIndex,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let num_halfedges: usize = faces.iter().map(|f| f.as_ref().len()).sum();
    let mut mesh = HalfEdgeMesh::with_capacity(num_halfedges / 2, num_halfedges, faces.len());
    let mut keys = VertexKeys::new();

    // Resolve every loop before creating any half-edge.
    let mut loops: Vec<Vec<VertexId<I>>> = Vec::with_capacity(faces.len());
    for (fi, face) in faces.iter().enumerate() {
        let ids: Vec<VertexId<I>> = face
            .as_ref()
            .iter()
            .map(|k| keys.intern(k, &mut mesh))
            .collect();
        loops.push(clean_loop(fi, ids, options.duplicates)?);
    }

    for ids in &loops {
        add_face_loop(&mut mesh, ids);
    }

    if options.check_manifold {
        EdgeMatchIndex::from_mesh(&mesh)?;
    }

    log::debug!(
        "built mesh: {} vertices, {} faces, {} half-edges",
        mesh.num_vertices(),
        mesh.num_faces(),
        mesh.num_halfedges()
    );

    Ok(BuiltMesh { mesh, keys })
}

/// Apply the duplicate policy to one loop and check its length.
fn clean_loop<I: MeshIndex>(
    face: usize,
    ids: Vec<VertexId<I>>,
    policy: DuplicateVertexPolicy,
) -> Result<Vec<VertexId<I>>> {
    let mut cleaned: Vec<VertexId<I>> = Vec::with_capacity(ids.len());
    for v in ids {
        if !cleaned.contains(&v) {
            cleaned.push(v);
            continue;
        }
        match policy {
            DuplicateVertexPolicy::Reject => {
                return Err(MeshError::malformed(face, "repeated vertex"));
            }
            DuplicateVertexPolicy::Collapse => {
                log::warn!("face {}: dropping repeated vertex {:?}", face, v);
            }
        }
    }

    if cleaned.len() < 3 {
        return Err(MeshError::malformed(face, "fewer than three distinct vertices"));
    }
    Ok(cleaned)
}

/// Append one face with its half-edge loop. Half-edge `i` of the loop points
/// at `ids[i]` and the face's entry is the one pointing at `ids[0]`.
pub(crate) fn add_face_loop<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    ids: &[VertexId<I>],
) -> FaceId<I> {
    let n = ids.len();
    let base = mesh.halfedge_slots();
    let face = mesh.alloc_face(Face::new(HalfEdgeId::new(base)));

    for (i, &v) in ids.iter().enumerate() {
        let he = mesh.alloc_halfedge(HalfEdge {
            dest: v,
            next: HalfEdgeId::new(base + (i + 1) % n),
            prev: HalfEdgeId::new(base + (i + n - 1) % n),
            face,
            ..HalfEdge::new()
        });
        mesh.vertex_mut(v).halfedge = he;
    }

    face
}

/// Convert a mesh back to a list of vertex loops, one per live face.
pub fn to_face_list<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<VertexId<I>>> {
    mesh.face_ids()
        .map(|f| mesh.face_vertices(f).collect())
        .collect()
}
