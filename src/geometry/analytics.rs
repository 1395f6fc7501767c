// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric measurement: volume, surface area and bounds

use super::topology::is_watertight;
use super::{BoundingBox, Mesh};
use crate::error::{QuoteError, QuoteResult};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

const MM3_PER_CM3: f64 = 1000.0;
const MM2_PER_CM2: f64 = 100.0;

/// Measurements of a mesh at a given scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryMetrics {
    /// Enclosed volume in cm³, scaled by `scale³`
    pub volume_cm3: f64,
    /// Surface area in cm², scaled by `scale²`
    pub area_cm2: f64,
    /// Unscaled bounds in mm
    pub bbox: BoundingBox,
    /// Bounding-box extents in mm, scaled by `scale`
    pub extents_mm: Vector3<f64>,
    pub scale: f64,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub watertight: bool,
}

impl GeometryMetrics {
    /// Pretty print metrics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              GEOMETRY ANALYTICS                          ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!(
            "║ Volume:          {:>10.2} cm³                      ║",
            self.volume_cm3
        );
        println!(
            "║ Surface Area:    {:>10.2} cm²                      ║",
            self.area_cm2
        );
        println!(
            "║ Scale:           {:>10.3}                          ║",
            self.scale
        );
        println!("║                                                          ║");
        println!(
            "║ Size: {:>8.1} × {:>8.1} × {:>8.1} mm                ║",
            self.extents_mm.x, self.extents_mm.y, self.extents_mm.z
        );
        println!("║                                                          ║");
        println!(
            "║ Vertices:        {:>10}                              ║",
            self.vertex_count
        );
        println!(
            "║ Triangles:       {:>10}                              ║",
            self.triangle_count
        );
        println!(
            "║ Watertight:      {:>10}                              ║",
            if self.watertight { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Measure a mesh, applying a uniform scale factor
///
/// Fails with `ComputationError` for an empty mesh, out-of-range face
/// indices, a non-positive scale, or any non-finite result.
pub fn analyze(mesh: &Mesh, scale: f64) -> QuoteResult<GeometryMetrics> {
    if mesh.vertices.is_empty() {
        return Err(QuoteError::computation("mesh has no vertices"));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(QuoteError::computation(format!(
            "scale must be positive, got {scale}"
        )));
    }
    if !mesh.indices_in_bounds() {
        return Err(QuoteError::computation(
            "face index outside vertex range",
        ));
    }

    let volume_mm3 = signed_volume_mm3(mesh).abs();
    let area_mm2 = surface_area_mm2(mesh);
    let bbox = mesh.bounding_box();

    let volume_cm3 = volume_mm3 / MM3_PER_CM3 * scale.powi(3);
    let area_cm2 = area_mm2 / MM2_PER_CM2 * scale.powi(2);
    let extents_mm = bbox.size() * scale;

    if !volume_cm3.is_finite() || !area_cm2.is_finite() || extents_mm.iter().any(|e| !e.is_finite())
    {
        return Err(QuoteError::computation("non-finite measurement"));
    }

    Ok(GeometryMetrics {
        volume_cm3,
        area_cm2,
        bbox,
        extents_mm,
        scale,
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        watertight: is_watertight(mesh),
    })
}

/// Signed volume of the tetrahedron spanned by a triangle and the origin
pub(crate) fn tetrahedron_volume(corners: &[Point3<f64>; 3]) -> f64 {
    let [v0, v1, v2] = corners;
    v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0
}

/// Signed enclosed volume in mm³ (divergence theorem)
///
/// Positive for outward winding. Triangles with out-of-range indices are skipped.
pub fn signed_volume_mm3(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .filter_map(|t| mesh.corners(t))
        .map(|corners| tetrahedron_volume(&corners))
        .sum()
}

/// Total surface area in mm²
pub fn surface_area_mm2(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .filter_map(|t| mesh.corners(t))
        .map(|[v0, v1, v2]| (v1 - v0).cross(&(v2 - v0)).norm() / 2.0)
        .sum()
}
