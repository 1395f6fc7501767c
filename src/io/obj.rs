// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wavefront OBJ decoding

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{DecodedMesh, Mesh, Triangle};
use nalgebra::Point3;
use std::io::Cursor;
use tracing::debug;

/// Decode OBJ text; each object or group becomes one fragment
///
/// Polygons are triangulated, points and lines are ignored, and material
/// libraries are never opened.
pub(crate) fn decode(bytes: &[u8]) -> QuoteResult<DecodedMesh> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let mut reader = Cursor::new(bytes);
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(|e| QuoteError::malformed("obj", e.to_string()))?;

    let mut fragments = Vec::with_capacity(models.len());
    for model in &models {
        let obj_mesh = &model.mesh;
        let mut mesh =
            Mesh::with_capacity(obj_mesh.positions.len() / 3, obj_mesh.indices.len() / 3);

        for p in obj_mesh.positions.chunks_exact(3) {
            mesh.add_vertex(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64));
        }

        for face in obj_mesh.indices.chunks_exact(3) {
            let triangle =
                Triangle::new([face[0] as usize, face[1] as usize, face[2] as usize]);
            if !triangle.is_degenerate() {
                mesh.add_triangle(triangle);
            }
        }

        if !mesh.indices_in_bounds() {
            return Err(QuoteError::malformed(
                "obj",
                format!("object '{}' references a missing vertex", model.name),
            ));
        }

        debug!(
            "OBJ object '{}': {} vertices, {} triangles",
            model.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        fragments.push(mesh);
    }

    Ok(match fragments.len() {
        1 => DecodedMesh::Single(fragments.remove(0)),
        _ => DecodedMesh::Multi(fragments),
    })
}
