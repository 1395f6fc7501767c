// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL decoding (binary and ASCII)

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{Mesh, Triangle};
use nalgebra::Point3;
use std::io::Cursor;
use tracing::debug;

/// Decode STL bytes into an indexed mesh
///
/// `stl_io` merges identical corner positions, so shared edges come out
/// shared and watertightness can be judged on the result.
pub(crate) fn decode(bytes: &[u8]) -> QuoteResult<Mesh> {
    let mut reader = Cursor::new(bytes);
    let stl = stl_io::read_stl(&mut reader)
        .map_err(|e| QuoteError::malformed("stl", e.to_string()))?;

    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.add_vertex(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64));
    }

    let mut skipped = 0;
    for face in &stl.faces {
        let triangle = Triangle::new(face.vertices);
        if triangle.is_degenerate() {
            skipped += 1;
            continue;
        }
        mesh.add_triangle(triangle);
    }

    if skipped > 0 {
        debug!("Skipped {} degenerate STL triangles", skipped);
    }

    Ok(mesh)
}
