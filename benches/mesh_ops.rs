//! Benchmarks for mesh operations.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use meshtopo::prelude::*;

/// Triangulated n x n grid. Every other row of triangles is declared with
/// reversed winding so that orientation has work to do.
fn grid_faces(n: usize, scramble: bool) -> Vec<[usize; 3]> {
    let mut faces = Vec::with_capacity(n * n * 2);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            if scramble && j % 2 == 1 {
                faces.push([v00, v11, v10]);
                faces.push([v00, v01, v11]);
            } else {
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
    }
    faces
}

fn build(faces: &[[usize; 3]]) -> HalfEdgeMesh {
    let built: BuiltMesh<usize> = build_mesh(faces, &BuildOptions::default()).unwrap();
    built.mesh
}

fn bench_mesh_construction(c: &mut Criterion) {
    let faces = grid_faces(50, false);
    c.bench_function("build_grid_50x50", |b| {
        b.iter(|| build(black_box(&faces)))
    });

    let mesh = build(&faces);
    c.bench_function("edge_match_grid_50x50", |b| {
        b.iter(|| EdgeMatchIndex::from_mesh(black_box(&mesh)).unwrap())
    });
}

fn bench_orientation(c: &mut Criterion) {
    let faces = grid_faces(50, true);
    let mesh = build(&faces);

    c.bench_function("propagate_grid_50x50", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut m| propagate_orientation(&mut m).unwrap(),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("orient_and_link_grid_50x50", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut m| orient_and_link(&mut m).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_split_join(c: &mut Criterion) {
    let octagon: Vec<usize> = (0..8).collect();
    let built: BuiltMesh<usize> = build_mesh(&[octagon], &BuildOptions::default()).unwrap();
    let mut mesh = built.mesh;
    let f = mesh.face_ids().next().unwrap();
    let vs: Vec<VertexId> = mesh.face_vertices(f).collect();

    c.bench_function("split_join_octagon", |b| {
        b.iter(|| {
            let split = mesh.split_face(f, vs[0], vs[4]).unwrap();
            mesh.join_face(split.face, split.new_face, split.halfedge)
                .unwrap()
        })
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let mut mesh = build(&grid_faces(50, false));
    orient_and_link(&mut mesh).unwrap();

    c.bench_function("vertex_fans_grid_50x50", |b| {
        b.iter(|| {
            let mut total = 0;
            for v in mesh.vertex_ids() {
                total += mesh.valence(v);
            }
            total
        })
    });
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_orientation,
    bench_split_join,
    bench_mesh_traversal
);
criterion_main!(benches);
