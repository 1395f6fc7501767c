// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;
use printquote::geometry::{analyze, fix_normals, repair, Mesh, Triangle};
use printquote::io;
use printquote::{QuoteEngine, QuoteRequest};
use std::f64::consts::PI;

fn uv_sphere(radius: f64, slices: usize, stacks: usize) -> Mesh {
    let mut mesh = Mesh::new();
    let north = mesh.add_vertex(Point3::new(0.0, 0.0, radius));
    let mut rings = Vec::new();
    for i in 1..stacks {
        let theta = PI * i as f64 / stacks as f64;
        let ring: Vec<usize> = (0..slices)
            .map(|j| {
                let phi = 2.0 * PI * j as f64 / slices as f64;
                mesh.add_vertex(Point3::new(
                    radius * theta.sin() * phi.cos(),
                    radius * theta.sin() * phi.sin(),
                    radius * theta.cos(),
                ))
            })
            .collect();
        rings.push(ring);
    }
    let south = mesh.add_vertex(Point3::new(0.0, 0.0, -radius));

    let next = |j: usize| (j + 1) % slices;
    for j in 0..slices {
        mesh.add_triangle(Triangle::new([north, rings[0][j], rings[0][next(j)]]));
    }
    for pair in rings.windows(2) {
        for j in 0..slices {
            let (a, b) = (pair[0][j], pair[0][next(j)]);
            let (c, d) = (pair[1][j], pair[1][next(j)]);
            mesh.add_triangle(Triangle::new([a, c, d]));
            mesh.add_triangle(Triangle::new([a, d, b]));
        }
    }
    let last = &rings[rings.len() - 1];
    for j in 0..slices {
        mesh.add_triangle(Triangle::new([south, last[next(j)], last[j]]));
    }
    mesh
}

fn to_stl(mesh: &Mesh) -> Vec<u8> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles
        .iter()
        .filter_map(|t| mesh.corners(t))
        .map(|corners| stl_io::Triangle {
            normal: stl_io::Normal::new([0.0, 0.0, 0.0]),
            vertices: corners.map(|p| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
        })
        .collect();
    let mut bytes = Vec::new();
    stl_io::write_stl(&mut bytes, triangles.iter()).unwrap();
    bytes
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for slices in [32, 128] {
        let stl = to_stl(&uv_sphere(20.0, slices, slices / 2));
        group.bench_with_input(BenchmarkId::new("stl_sphere", slices), &stl, |b, bytes| {
            b.iter(|| io::decode(black_box(bytes), "stl").unwrap());
        });
    }

    group.finish();
}

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");

    let mut scrambled = uv_sphere(20.0, 128, 64);
    for i in (0..scrambled.triangle_count()).step_by(3) {
        scrambled.triangles[i].flip();
    }

    group.bench_function("fix_normals", |b| {
        b.iter(|| fix_normals(black_box(scrambled.clone())))
    });

    let mut open = uv_sphere(20.0, 128, 64);
    open.triangles.truncate(open.triangle_count() - 128);
    group.bench_function("fill_holes", |b| b.iter(|| repair(black_box(open.clone()))));

    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let mesh = uv_sphere(20.0, 256, 128);
    c.bench_function("analyze_sphere_256", |b| {
        b.iter(|| analyze(black_box(&mesh), black_box(1.5)).unwrap())
    });
}

fn bench_quote(c: &mut Criterion) {
    let engine = QuoteEngine::default();
    let stl = to_stl(&uv_sphere(30.0, 128, 64));

    c.bench_function("quote_stl_sphere", |b| {
        b.iter(|| {
            let request = QuoteRequest::new(stl.clone(), "sphere.stl", "PETG");
            engine.quote(black_box(&request)).unwrap()
        })
    });
}

criterion_group!(benches, bench_decode, bench_repair, bench_analyze, bench_quote);
criterion_main!(benches);
