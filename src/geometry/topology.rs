// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge connectivity queries
//! Provides the face adjacency needed by watertightness checks and repair

use super::Mesh;
use std::collections::HashMap;

/// Undirected edge key (smaller index first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub v0: usize,
    pub v1: usize,
}

impl EdgeKey {
    pub fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }
}

/// One face's use of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeUse {
    pub face: usize,
    /// True when the face traverses the edge from `v0` to `v1`
    pub forward: bool,
}

/// Map from each undirected edge to the faces using it
#[derive(Debug, Clone, Default)]
pub struct EdgeMap {
    uses: HashMap<EdgeKey, Vec<EdgeUse>>,
}

impl EdgeMap {
    pub fn build(mesh: &Mesh) -> Self {
        let mut uses: HashMap<EdgeKey, Vec<EdgeUse>> =
            HashMap::with_capacity(mesh.triangle_count() * 3 / 2);

        for (face, triangle) in mesh.triangles.iter().enumerate() {
            for (a, b) in triangle.edges() {
                let key = EdgeKey::new(a, b);
                uses.entry(key).or_default().push(EdgeUse {
                    face,
                    forward: a == key.v0,
                });
            }
        }

        Self { uses }
    }

    /// Faces using the edge between `a` and `b`
    pub fn faces_of(&self, a: usize, b: usize) -> &[EdgeUse] {
        self.uses
            .get(&EdgeKey::new(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.uses.len()
    }

    /// Edges used by exactly one face
    pub fn boundary_edge_count(&self) -> usize {
        self.uses.values().filter(|u| u.len() == 1).count()
    }

    /// Edges used by more than two faces
    pub fn non_manifold_edge_count(&self) -> usize {
        self.uses.values().filter(|u| u.len() > 2).count()
    }

    /// Edges shared by two faces traversing them in the same direction
    pub fn inconsistent_edge_count(&self) -> usize {
        self.uses
            .values()
            .filter(|u| u.len() == 2 && u[0].forward == u[1].forward)
            .count()
    }

    /// Faces grouped by connectivity through shared edges
    pub fn components(&self, mesh: &Mesh) -> Vec<Vec<usize>> {
        let mut label = vec![usize::MAX; mesh.triangle_count()];
        let mut components = Vec::new();

        for start in 0..mesh.triangle_count() {
            if label[start] != usize::MAX {
                continue;
            }
            let id = components.len();
            label[start] = id;
            let mut faces = vec![start];
            let mut stack = vec![start];

            while let Some(face) = stack.pop() {
                for (a, b) in mesh.triangles[face].edges() {
                    for other in self.faces_of(a, b) {
                        if label[other.face] == usize::MAX {
                            label[other.face] = id;
                            faces.push(other.face);
                            stack.push(other.face);
                        }
                    }
                }
            }
            components.push(faces);
        }

        components
    }

    /// Closed 2-manifold with consistent winding
    pub fn is_watertight(&self) -> bool {
        !self.uses.is_empty()
            && self
                .uses
                .values()
                .all(|u| u.len() == 2 && u[0].forward != u[1].forward)
    }
}

/// Check whether every edge bounds exactly two faces with opposite traversal
pub fn is_watertight(mesh: &Mesh) -> bool {
    EdgeMap::build(mesh).is_watertight()
}
