//! Benchmarks for polyhedron construction and vertex drags.
//!
//! Run with: cargo bench -p brushwork-kernel

#![allow(missing_docs)]

use std::f64::consts::TAU;

use brushwork_face::{Face, FaceAttributes};
use brushwork_kernel::Polyhedron;
use brushwork_math::{Aabb3, Plane, Point3, Tolerance, Vec3};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// =============================================================================
// Fixtures
// =============================================================================

fn face(normal: Vec3, distance: f64) -> Face {
    Face::from_plane(Plane::new(normal, distance), FaceAttributes::default())
        .expect("finite plane")
}

fn world() -> Polyhedron {
    Polyhedron::new(Aabb3::cube(16384.0), Tolerance::DEFAULT)
}

fn cube_faces(half: f64) -> Vec<Face> {
    [Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()]
        .into_iter()
        .map(|n| face(n, half))
        .collect()
}

/// A prism with `sides` walls around the Z axis, capped top and bottom.
fn prism_faces(sides: usize, radius: f64) -> Vec<Face> {
    let mut faces: Vec<Face> = (0..sides)
        .map(|i| {
            let a = TAU * i as f64 / sides as f64;
            face(Vec3::new(a.cos(), a.sin(), 0.0), radius)
        })
        .collect();
    faces.push(face(Vec3::z(), 64.0));
    faces.push(face(-Vec3::z(), 64.0));
    faces
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    group.bench_function("cube", |b| {
        b.iter(|| {
            let mut poly = world();
            poly.add_faces(black_box(cube_faces(64.0))).expect("cube");
            poly
        })
    });

    for sides in [8, 16, 32, 64] {
        group.bench_with_input(BenchmarkId::new("prism", sides), &sides, |b, &sides| {
            b.iter(|| {
                let mut poly = world();
                poly.add_faces(black_box(prism_faces(sides, 128.0)))
                    .expect("prism");
                poly
            })
        });
    }

    group.finish();
}

fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("moves");

    let mut cube = world();
    cube.add_faces(cube_faces(64.0)).expect("cube");
    let corner = cube
        .find_vertex(&Point3::new(64.0, 64.0, 64.0))
        .expect("corner");

    group.bench_function("drag_corner_out", |b| {
        b.iter(|| {
            let mut poly = cube.clone();
            poly.move_vertex(corner, black_box(Vec3::new(16.0, 16.0, 16.0)))
                .expect("move")
        })
    });

    group.bench_function("drag_corner_clamped", |b| {
        b.iter(|| {
            let mut poly = cube.clone();
            poly.move_vertex(corner, black_box(Vec3::new(0.0, -256.0, 0.0)))
                .expect("move")
        })
    });

    let mut prism = world();
    prism.add_faces(prism_faces(32, 128.0)).expect("prism");
    let (top, _) = prism
        .sides()
        .find(|(sid, _)| {
            prism
                .side_plane(*sid)
                .map(|p| p.normal.z > 0.99)
                .unwrap_or(false)
        })
        .expect("top cap");

    group.bench_function("lift_prism_cap", |b| {
        b.iter(|| {
            let mut poly = prism.clone();
            poly.move_side(top, black_box(Vec3::new(0.0, 0.0, 32.0)))
                .expect("move")
        })
    });

    group.finish();
}

criterion_group!(benches, bench_construction, bench_moves);
criterion_main!(benches);
