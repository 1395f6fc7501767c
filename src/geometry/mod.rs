// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, repair and measurement

mod analytics;
mod bbox;
mod mesh;
mod normalize;
mod repair;
mod topology;

pub use analytics::{analyze, signed_volume_mm3, surface_area_mm2, GeometryMetrics};
pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle};
pub use normalize::{normalize, DecodedMesh};
pub use repair::{fill_holes, fix_normals, repair, weld_vertices, RepairOutcome, RepairReport};
pub use topology::{is_watertight, EdgeKey, EdgeMap, EdgeUse};
