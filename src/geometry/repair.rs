// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Best-effort topology repair
//!
//! Repair only changes connectivity and face orientation, never vertex
//! positions. Each step consumes the mesh and hands back the repaired value,
//! so no caller keeps a reference to a mesh that changes underneath it.

use super::analytics::tetrahedron_volume;
use super::topology::{is_watertight, EdgeMap};
use super::{BoundingBox, Mesh, Triangle};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::PI;
use tracing::{debug, info, warn};

/// Relative distance under which a vertex counts as lying in a plane
const PLANE_TOLERANCE: f64 = 1e-9;

/// Result of [`repair`]
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub mesh: Mesh,
    pub watertight: bool,
    pub report: RepairReport,
}

/// What the repair pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub attempted: bool,
    pub vertices_welded: usize,
    pub faces_flipped: usize,
    pub holes_filled: usize,
}

/// Approach a closed, consistently wound solid
///
/// A watertight input is returned untouched. Otherwise coincident vertices
/// are welded, winding is made consistent, boundary loops are triangulated,
/// and winding is fixed again so the patches agree with their neighbours.
/// Never fails: the returned flag reports whether the result is watertight.
pub fn repair(mesh: Mesh) -> RepairOutcome {
    if is_watertight(&mesh) {
        debug!("Mesh already watertight, skipping repair");
        return RepairOutcome {
            mesh,
            watertight: true,
            report: RepairReport::default(),
        };
    }

    let (mesh, vertices_welded) = weld_vertices(mesh);
    let (mesh, flipped_before) = fix_normals(mesh);
    let (mesh, holes_filled) = fill_holes(mesh);
    let (mesh, flipped_after) = if holes_filled > 0 {
        fix_normals(mesh)
    } else {
        (mesh, 0)
    };

    let watertight = is_watertight(&mesh);
    let report = RepairReport {
        attempted: true,
        vertices_welded,
        faces_flipped: flipped_before + flipped_after,
        holes_filled,
    };

    if watertight {
        info!(
            vertices_welded,
            faces_flipped = report.faces_flipped,
            holes_filled,
            "Repaired mesh is watertight"
        );
    } else {
        warn!(
            vertices_welded,
            faces_flipped = report.faces_flipped,
            holes_filled,
            "Mesh is still not watertight after repair"
        );
    }

    RepairOutcome {
        mesh,
        watertight,
        report,
    }
}

/// Point triangles at one index per distinct position
///
/// Vertices with bit-identical coordinates share an index afterwards. The
/// vertex list itself is kept as is; duplicates are simply no longer
/// referenced. Faces that collapse onto a repeated index are dropped.
/// Returns the number of vertices folded into an earlier one.
pub fn weld_vertices(mut mesh: Mesh) -> (Mesh, usize) {
    let mut first_seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(mesh.vertex_count());
    let mut canonical = Vec::with_capacity(mesh.vertex_count());
    let mut welded = 0;

    for (index, p) in mesh.vertices.iter().enumerate() {
        // adding zero folds -0.0 into 0.0
        let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
        let target = *first_seen.entry(key).or_insert(index);
        if target != index {
            welded += 1;
        }
        canonical.push(target);
    }

    if welded == 0 {
        return (mesh, 0);
    }

    let before = mesh.triangle_count();
    mesh.triangles = mesh
        .triangles
        .iter()
        .map(|t| Triangle::new(t.indices.map(|i| canonical.get(i).copied().unwrap_or(i))))
        .filter(|t| !t.is_degenerate())
        .collect();

    let dropped = before - mesh.triangle_count();
    info!(
        "Welded {} coincident vertices, dropped {} collapsed faces",
        welded, dropped
    );
    (mesh, welded)
}

/// Faces reached by one orientation flood
struct Shell {
    faces: Vec<usize>,
    closed: bool,
}

/// Make face winding consistent across each connected component
///
/// Orientation spreads breadth-first over manifold edges: a neighbour must
/// traverse the shared edge opposite to the current face. Each closed
/// component is then oriented by nesting: one enclosed by an even number of
/// other closed components faces outward (positive volume), one enclosed by
/// an odd number is a cavity and faces inward. Returns the number of faces
/// flipped.
pub fn fix_normals(mut mesh: Mesh) -> (Mesh, usize) {
    let face_count = mesh.triangle_count();
    if face_count == 0 {
        return (mesh, 0);
    }

    let edges = EdgeMap::build(&mesh);
    let mut visited = vec![false; face_count];
    let mut flipped = vec![false; face_count];
    let mut shells = Vec::new();

    for start in 0..face_count {
        if visited[start] {
            continue;
        }

        visited[start] = true;
        let mut shell = Shell {
            faces: vec![start],
            closed: true,
        };
        let mut queue = VecDeque::from([start]);

        while let Some(face) = queue.pop_front() {
            for (a, b) in mesh.triangles[face].edges() {
                let uses = edges.faces_of(a, b);
                if uses.len() != 2 {
                    shell.closed = false;
                    continue;
                }

                let (mine, other) = if uses[0].face == face {
                    (uses[0], uses[1])
                } else {
                    (uses[1], uses[0])
                };
                if other.face == face || visited[other.face] {
                    continue;
                }

                let effective = mine.forward != flipped[face];
                visited[other.face] = true;
                flipped[other.face] = other.forward == effective;
                shell.faces.push(other.face);
                queue.push_back(other.face);
            }
        }

        shells.push(shell);
    }

    let closed: Vec<&Shell> = shells.iter().filter(|s| s.closed).collect();
    let bounds: Vec<BoundingBox> = closed
        .iter()
        .map(|shell| shell_bounds(&mesh, &shell.faces))
        .collect();

    let mut inversions = Vec::new();
    for (i, shell) in closed.iter().enumerate() {
        let Some(sample) = shell
            .faces
            .first()
            .and_then(|&face| mesh.vertices.get(mesh.triangles[face].indices[0]))
        else {
            continue;
        };

        let depth = closed
            .iter()
            .zip(&bounds)
            .enumerate()
            .filter(|&(j, (other, bbox))| {
                j != i
                    && contains(bbox, sample)
                    && winding_number(&mesh, &other.faces, &flipped, sample).abs() > 0.5
            })
            .count();

        let volume: f64 = shell
            .faces
            .iter()
            .filter_map(|&face| {
                let corners = mesh.corners(&mesh.triangles[face])?;
                let v = tetrahedron_volume(&corners);
                Some(if flipped[face] { -v } else { v })
            })
            .sum();

        let cavity = depth % 2 == 1;
        if (cavity && volume > 0.0) || (!cavity && volume < 0.0) {
            inversions.push(i);
        }
    }
    for i in inversions {
        for &face in &closed[i].faces {
            flipped[face] = !flipped[face];
        }
    }

    let mut flip_count = 0;
    for (triangle, &flip) in mesh.triangles.iter_mut().zip(&flipped) {
        if flip {
            triangle.flip();
            flip_count += 1;
        }
    }

    if flip_count > 0 {
        info!(
            "Fixed winding order: flipped {} faces across {} component(s)",
            flip_count,
            shells.len()
        );
    } else {
        debug!(
            "Winding order already consistent across {} component(s)",
            shells.len()
        );
    }

    (mesh, flip_count)
}

fn shell_bounds(mesh: &Mesh, faces: &[usize]) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    for corners in faces.iter().filter_map(|&f| mesh.corners(&mesh.triangles[f])) {
        for p in &corners {
            bbox.include(p);
        }
    }
    bbox
}

fn contains(bbox: &BoundingBox, p: &Point3<f64>) -> bool {
    (0..3).all(|i| bbox.min[i] <= p[i] && p[i] <= bbox.max[i])
}

/// Generalized winding number of a closed shell around `point`
///
/// Sums the solid angle of every face (Van Oosterom and Strackee). Close to
/// ±1 inside the shell and 0 outside, whichever way the shell is wound.
fn winding_number(mesh: &Mesh, faces: &[usize], flipped: &[bool], point: &Point3<f64>) -> f64 {
    let total: f64 = faces
        .iter()
        .filter_map(|&face| {
            let [a, b, c] = mesh.corners(&mesh.triangles[face])?;
            let (a, b, c) = (a - *point, b - *point, c - *point);
            let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
            let numerator = a.dot(&b.cross(&c));
            let denominator = la * lb * lc + a.dot(&b) * lc + a.dot(&c) * lb + b.dot(&c) * la;
            let omega = 2.0 * numerator.atan2(denominator);
            Some(if flipped[face] { -omega } else { omega })
        })
        .sum();
    total / (4.0 * PI)
}

/// Close boundary loops with fan triangulation
///
/// Boundary edges are followed in the direction their single face traverses
/// them; patches traverse them the other way, so consistent input stays
/// consistent. A loop stays open when it cannot be traced back to its start,
/// when a patch would duplicate an existing face, or when the loop rims a
/// flat sheet that a patch would only cover from behind.
/// Returns the number of holes filled.
pub fn fill_holes(mut mesh: Mesh) -> (Mesh, usize) {
    let edges = EdgeMap::build(&mesh);

    let boundary: Vec<(usize, usize, usize)> = mesh
        .triangles
        .iter()
        .enumerate()
        .flat_map(|(face, t)| t.edges().map(|(a, b)| (a, b, face)))
        .filter(|&(a, b, _)| edges.faces_of(a, b).len() == 1)
        .collect();

    if boundary.is_empty() {
        return (mesh, 0);
    }
    debug!("Found {} boundary edges", boundary.len());

    let components = edges.components(&mesh);
    let mut component_of = vec![0; mesh.triangle_count()];
    for (id, faces) in components.iter().enumerate() {
        for &face in faces {
            component_of[face] = id;
        }
    }

    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, &(a, _, _)) in boundary.iter().enumerate() {
        outgoing.entry(a).or_default().push(i);
    }

    let mut existing: HashSet<[usize; 3]> =
        mesh.triangles.iter().map(|t| sorted(t.indices)).collect();
    let mut used = vec![false; boundary.len()];
    let mut patches = Vec::new();
    let mut filled = 0;
    let mut open_loops = 0;

    for start in 0..boundary.len() {
        if used[start] {
            continue;
        }

        let (origin, _, owner) = boundary[start];
        let mut loop_vertices = Vec::new();
        let mut current = start;
        let mut closed = false;

        loop {
            used[current] = true;
            let (a, b, _) = boundary[current];
            loop_vertices.push(a);

            if b == origin {
                closed = true;
                break;
            }

            let next = outgoing
                .get(&b)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
            match next {
                Some(i) => current = i,
                None => break,
            }
        }

        if !closed || loop_vertices.len() < 3 {
            open_loops += 1;
            continue;
        }

        let v0 = loop_vertices[0];
        let fan: Vec<Triangle> = loop_vertices[1..]
            .windows(2)
            .map(|pair| Triangle::new([v0, pair[1], pair[0]]))
            .filter(|patch| !patch.is_degenerate())
            .collect();

        let duplicates = fan.iter().any(|patch| existing.contains(&sorted(patch.indices)));
        if duplicates || rims_flat_sheet(&mesh, &components[component_of[owner]], &loop_vertices) {
            debug!(
                "Leaving {}-edge loop open: patch would cover existing faces",
                loop_vertices.len()
            );
            open_loops += 1;
            continue;
        }

        existing.extend(fan.iter().map(|patch| sorted(patch.indices)));
        patches.extend(fan);
        filled += 1;
    }

    if open_loops > 0 {
        warn!("{} boundary loop(s) could not be closed", open_loops);
    }
    if filled > 0 {
        info!("Filled {} holes with {} triangles", filled, patches.len());
    }

    mesh.triangles.extend(patches);
    (mesh, filled)
}

fn sorted(mut indices: [usize; 3]) -> [usize; 3] {
    indices.sort_unstable();
    indices
}

/// True when the loop and every face of its component share one plane
fn rims_flat_sheet(mesh: &Mesh, faces: &[usize], loop_vertices: &[usize]) -> bool {
    let points: Vec<Point3<f64>> = loop_vertices
        .iter()
        .filter_map(|&v| mesh.vertices.get(v).copied())
        .collect();
    let Some(&anchor) = points.first() else {
        return true;
    };

    // Newell's method
    let normal: Vector3<f64> = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.coords.cross(&q.coords))
        .sum();

    let bbox = shell_bounds(mesh, faces);
    let tolerance = PLANE_TOLERANCE * bbox.size().norm().max(1.0);
    let Some(unit) = normal.try_normalize(tolerance * tolerance) else {
        return true;
    };

    faces
        .iter()
        .filter_map(|&face| mesh.corners(&mesh.triangles[face]))
        .flatten()
        .all(|p| (p - anchor).dot(&unit).abs() <= tolerance)
}
