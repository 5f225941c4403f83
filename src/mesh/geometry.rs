//! Vertex geometry attached beside the topology.

use nalgebra::{Point3, Vector3};

use super::attributes::Attributes;
use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Positions and optional normals for the vertices of one mesh.
#[derive(Debug, Clone, Default)]
pub struct Geometry<I: MeshIndex = u32> {
    positions: Attributes<VertexId<I>, Point3<f64>>,
    normals: Attributes<VertexId<I>, Vector3<f64>>,
}

impl<I: MeshIndex> Geometry<I> {
    /// Create empty geometry.
    pub fn new() -> Self {
        Self {
            positions: Attributes::new(),
            normals: Attributes::new(),
        }
    }

    /// Geometry from `(vertex, position)` pairs.
    pub fn from_positions(positions: impl IntoIterator<Item = (VertexId<I>, Point3<f64>)>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
            normals: Attributes::new(),
        }
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> Option<&Point3<f64>> {
        self.positions.get(v)
    }

    /// Set the position of a vertex.
    pub fn set_position(&mut self, v: VertexId<I>, p: Point3<f64>) {
        self.positions.insert(v, p);
    }

    /// Normal of a vertex, if one was attached.
    #[inline]
    pub fn normal(&self, v: VertexId<I>) -> Option<&Vector3<f64>> {
        self.normals.get(v)
    }

    /// Attach a normal to a vertex.
    pub fn set_normal(&mut self, v: VertexId<I>, n: Vector3<f64>) {
        self.normals.insert(v, n);
    }

    /// The position table.
    pub fn positions(&self) -> &Attributes<VertexId<I>, Point3<f64>> {
        &self.positions
    }

    fn require(&self, v: VertexId<I>) -> Result<Point3<f64>> {
        self.position(v)
            .copied()
            .ok_or(MeshError::MissingPosition { vertex: v.index() })
    }

    /// Subdivide the edge of `he` and place the new vertex at its midpoint.
    ///
    /// If both endpoints carry normals, the new vertex gets their normalized
    /// average. Fails before touching the mesh if an endpoint has no position.
    pub fn split_edge_at_midpoint(
        &mut self,
        mesh: &mut HalfEdgeMesh<I>,
        he: HalfEdgeId<I>,
    ) -> Result<VertexId<I>> {
        mesh.ensure_halfedge(he)?;
        let (a, b) = (mesh.origin(he), mesh.dest(he));
        let pa = self.require(a)?;
        let pb = self.require(b)?;

        let m = mesh.add_vertex_edge(he)?;
        self.set_position(m, nalgebra::center(&pa, &pb));

        if let (Some(na), Some(nb)) = (self.normal(a), self.normal(b)) {
            if let Some(n) = (na + nb).try_normalize(1e-12) {
                self.set_normal(m, n);
            }
        }
        Ok(m)
    }

    /// Unnormalized Newell normal: its length is twice the face area.
    fn newell(&self, mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> Result<Vector3<f64>> {
        let points = mesh
            .face_vertices(f)
            .map(|v| self.require(v))
            .collect::<Result<Vec<_>>>()?;

        let mut n = Vector3::zeros();
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        Ok(n)
    }

    /// Unit normal of a planar or non-planar polygon by Newell's method.
    ///
    /// The normal follows the face's loop order. Returns `Ok(None)` for a
    /// face of zero area.
    pub fn face_normal(&self, mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> Result<Option<Vector3<f64>>> {
        mesh.ensure_face(f)?;
        Ok(self.newell(mesh, f)?.try_normalize(1e-12))
    }

    /// Area of a face, from the length of its Newell normal.
    pub fn face_area(&self, mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> Result<f64> {
        mesh.ensure_face(f)?;
        Ok(0.5 * self.newell(mesh, f)?.norm())
    }

    /// Area-weighted normal at a vertex over every face incident to it.
    pub fn vertex_normal(&self, mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Result<Option<Vector3<f64>>> {
        mesh.ensure_vertex(v)?;
        let mut n = Vector3::zeros();
        for f in mesh.vertex_faces(v) {
            n += self.newell(mesh, f)?;
        }
        Ok(n.try_normalize(1e-12))
    }
}
