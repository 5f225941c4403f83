//! Named-face text output.

use std::fmt::Display;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::algo::orient::OrientationTags;
use crate::error::Result;
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, Orientation, VertexId, VertexKeys};

fn vertex_name<K, I>(names: &VertexKeys<K, I>, v: VertexId<I>) -> String
where
    K: Hash + Eq + Clone + Display,
    I: MeshIndex,
{
    match names.key(v) {
        Some(k) => k.to_string(),
        None => format!("v{}", v.index()),
    }
}

/// Vertex order of a face as written: its loop from the entry vertex, or
/// that sequence reversed when the face is tagged `Flipped`. The reversal
/// matches the loop [`HalfEdgeMesh::apply_orientation`] leaves behind.
fn written_order<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    f: FaceId<I>,
    tag: Orientation,
) -> Vec<VertexId<I>> {
    let mut order: Vec<VertexId<I>> = mesh.face_vertices(f).collect();
    if tag == Orientation::Flipped {
        order.reverse();
    }
    order
}

/// Write the mesh as a vertex set and a block of named faces.
///
/// Vertices are named by their key in `names`, or `v<slot>` if they have
/// none. Faces are named `f<slot>`. Each face's orientation comes from
/// `tags` when given and from the face's stored tag otherwise.
///
/// Pass propagated tags only for a mesh whose loops were not reversed yet.
/// The tags returned by [`orient_and_link`] describe the declared winding,
/// and the mesh already carries the reversal; write such a mesh with
/// `None`, or the flipped faces come out reversed twice.
///
/// [`orient_and_link`]: crate::algo::orient::orient_and_link
pub fn write_mesh<W, K, I>(
    writer: &mut W,
    mesh: &HalfEdgeMesh<I>,
    names: &VertexKeys<K, I>,
    tags: Option<&OrientationTags<I>>,
) -> Result<()>
where
    W: Write,
    K: Hash + Eq + Clone + Display,
    I: MeshIndex,
{
    let vertices: Vec<String> = mesh.vertex_ids().map(|v| vertex_name(names, v)).collect();
    writeln!(writer, "vertices = {{ {} }};", vertices.join(", "))?;

    writeln!(writer, "mesh = {{")?;
    for f in mesh.face_ids() {
        let tag = match tags {
            Some(t) => t.get(f),
            None => mesh.orientation(f),
        };
        let loop_names: Vec<String> = written_order(mesh, f, tag)
            .into_iter()
            .map(|v| vertex_name(names, v))
            .collect();
        writeln!(writer, "  f{} = [{}];", f.index(), loop_names.join(", "))?;
    }
    writeln!(writer, "}};")?;
    Ok(())
}

/// Render the mesh to a string. See [`write_mesh`].
pub fn to_text<K, I>(
    mesh: &HalfEdgeMesh<I>,
    names: &VertexKeys<K, I>,
    tags: Option<&OrientationTags<I>>,
) -> Result<String>
where
    K: Hash + Eq + Clone + Display,
    I: MeshIndex,
{
    let mut buf = Vec::new();
    write_mesh(&mut buf, mesh, names, tags)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the mesh to a file. See [`write_mesh`].
pub fn save<P, K, I>(
    mesh: &HalfEdgeMesh<I>,
    names: &VertexKeys<K, I>,
    tags: Option<&OrientationTags<I>>,
    path: P,
) -> Result<()>
where
    P: AsRef<Path>,
    K: Hash + Eq + Clone + Display,
    I: MeshIndex,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_mesh(&mut writer, mesh, names, tags)?;
    writer.flush()?;
    Ok(())
}
