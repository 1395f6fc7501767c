// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Collapse decoder output into one canonical mesh

use super::Mesh;
use crate::error::{QuoteError, QuoteResult};
use tracing::debug;

/// Decoder output: one mesh, or several disjoint fragments
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMesh {
    Single(Mesh),
    Multi(Vec<Mesh>),
}

impl DecodedMesh {
    pub fn fragment_count(&self) -> usize {
        match self {
            DecodedMesh::Single(_) => 1,
            DecodedMesh::Multi(parts) => parts.len(),
        }
    }
}

/// Concatenate fragments into one mesh with consistent indexing
///
/// Fails with `NoGeometry` when the result has no triangles.
pub fn normalize(decoded: DecodedMesh) -> QuoteResult<Mesh> {
    let mesh = match decoded {
        DecodedMesh::Single(mesh) => mesh,
        DecodedMesh::Multi(parts) => {
            let vertex_total = parts.iter().map(Mesh::vertex_count).sum();
            let triangle_total = parts.iter().map(Mesh::triangle_count).sum();
            let mut mesh = Mesh::with_capacity(vertex_total, triangle_total);
            for part in &parts {
                mesh.merge(part);
            }
            debug!(
                fragments = parts.len(),
                vertices = mesh.vertex_count(),
                triangles = mesh.triangle_count(),
                "Merged mesh fragments"
            );
            mesh
        }
    };

    if mesh.is_empty() {
        return Err(QuoteError::NoGeometry);
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures::cube;
    use crate::error::ErrorKind;

    #[test]
    fn test_single_passes_through() {
        let mesh = normalize(DecodedMesh::Single(cube(2.0))).unwrap();
        assert_eq!(mesh, cube(2.0));
    }

    #[test]
    fn test_multi_concatenates_with_offsets() {
        let decoded = DecodedMesh::Multi(vec![cube(1.0), cube(3.0), cube(5.0)]);
        assert_eq!(decoded.fragment_count(), 3);

        let mesh = normalize(decoded).unwrap();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 36);
        assert!(mesh.indices_in_bounds());

        // third fragment references only its own vertex block
        for t in &mesh.triangles[24..] {
            assert!(t.indices.iter().all(|&i| (16..24).contains(&i)));
        }
    }

    #[test]
    fn test_empty_fragments_rejected() {
        let err = normalize(DecodedMesh::Multi(vec![Mesh::new(), Mesh::new()])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoGeometry);

        let err = normalize(DecodedMesh::Single(Mesh::new())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoGeometry);
    }
}
