// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared in-memory model fixtures

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const CUBE_FACES: [[usize; 3]; 12] = [
    [4, 5, 6],
    [4, 6, 7],
    [1, 0, 3],
    [1, 3, 2],
    [5, 1, 2],
    [5, 2, 6],
    [0, 4, 7],
    [0, 7, 3],
    [7, 6, 2],
    [7, 2, 3],
    [0, 1, 5],
    [0, 5, 4],
];

/// Corners of an axis-aligned box spanning `0..x`, `0..y`, `0..z`
pub fn box_vertices(x: f64, y: f64, z: f64) -> [[f64; 3]; 8] {
    [
        [0.0, 0.0, 0.0],
        [x, 0.0, 0.0],
        [x, y, 0.0],
        [0.0, y, 0.0],
        [0.0, 0.0, z],
        [x, 0.0, z],
        [x, y, z],
        [0.0, y, z],
    ]
}

/// Binary STL of a box
pub fn box_stl(x: f64, y: f64, z: f64) -> Vec<u8> {
    let v = box_vertices(x, y, z);
    let triangles: Vec<stl_io::Triangle> = CUBE_FACES
        .iter()
        .map(|face| {
            let corner = |i: usize| {
                let p = v[face[i]];
                stl_io::Vertex::new([p[0] as f32, p[1] as f32, p[2] as f32])
            };
            stl_io::Triangle {
                normal: stl_io::Normal::new([0.0, 0.0, 0.0]),
                vertices: [corner(0), corner(1), corner(2)],
            }
        })
        .collect();

    let mut bytes = Vec::new();
    stl_io::write_stl(&mut bytes, triangles.iter()).unwrap();
    bytes
}

pub fn cube_stl(size: f64) -> Vec<u8> {
    box_stl(size, size, size)
}

/// OBJ text of a box (1-based indices)
pub fn box_obj(x: f64, y: f64, z: f64) -> String {
    let mut obj = String::from("o box\n");
    for p in box_vertices(x, y, z) {
        obj.push_str(&format!("v {} {} {}\n", p[0], p[1], p[2]));
    }
    for f in CUBE_FACES {
        obj.push_str(&format!("f {} {} {}\n", f[0] + 1, f[1] + 1, f[2] + 1));
    }
    obj
}

/// OBJ text of a box where every face carries its own three vertices
pub fn unwelded_box_obj(x: f64, y: f64, z: f64) -> String {
    let v = box_vertices(x, y, z);
    let mut obj = String::from("o soup\n");
    for (n, f) in CUBE_FACES.iter().enumerate() {
        for &i in f {
            obj.push_str(&format!("v {} {} {}\n", v[i][0], v[i][1], v[i][2]));
        }
        let base = n * 3 + 1;
        obj.push_str(&format!("f {} {} {}\n", base, base + 1, base + 2));
    }
    obj
}

/// `<mesh>` element of a box translated by `offset`
pub fn box_mesh_xml(size: f64, offset: [f64; 3]) -> String {
    let mut xml = String::from("<mesh><vertices>");
    for p in box_vertices(size, size, size) {
        xml.push_str(&format!(
            r#"<vertex x="{}" y="{}" z="{}"/>"#,
            p[0] + offset[0],
            p[1] + offset[1],
            p[2] + offset[2]
        ));
    }
    xml.push_str("</vertices><triangles>");
    for f in CUBE_FACES {
        xml.push_str(&format!(r#"<triangle v1="{}" v2="{}" v3="{}"/>"#, f[0], f[1], f[2]));
    }
    xml.push_str("</triangles></mesh>");
    xml
}

/// 3MF model part holding the given mesh elements, one object each
pub fn model_xml(meshes: &[String]) -> String {
    let objects: String = meshes
        .iter()
        .enumerate()
        .map(|(i, m)| format!(r#"<object id="{}" type="model">{}</object>"#, i + 1, m))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>{objects}</resources>
  <build><item objectid="1"/></build>
</model>"#
    )
}

/// ZIP package with the given entries
pub fn package(entries: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn cube_3mf(size: f64) -> Vec<u8> {
    package(&[
        ("[Content_Types].xml", "<Types/>".to_string()),
        ("3D/3dmodel.model", model_xml(&[box_mesh_xml(size, [0.0; 3])])),
    ])
}
