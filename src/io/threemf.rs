// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3MF (3D Manufacturing Format) decoding
//!
//! A 3MF file is a ZIP archive holding one or more XML model parts. Every
//! `<mesh>` element of every part is appended to one triangle soup; triangle
//! indices are local to their mesh element and get shifted by the number of
//! vertices collected before it.

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{Mesh, Triangle};
use nalgebra::Point3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::str::FromStr;
use tracing::debug;
use zip::ZipArchive;

/// Archive entries ending in this suffix are model parts
pub const MODEL_PART_SUFFIX: &str = ".model";

pub(crate) fn decode(bytes: &[u8]) -> QuoteResult<Mesh> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| QuoteError::InvalidArchive {
            reason: e.to_string(),
        })?;

    let part_names = find_model_parts(&mut archive)?;
    if part_names.is_empty() {
        return Err(QuoteError::NoModelPart);
    }

    let mut mesh = Mesh::new();
    for name in &part_names {
        let mut entry = archive
            .by_name(name)
            .map_err(|e| QuoteError::InvalidArchive {
                reason: e.to_string(),
            })?;
        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|e| QuoteError::malformed("3mf", format!("cannot read {name}: {e}")))?;

        let elements = parse_model_part(&xml, name, &mut mesh)?;
        debug!(
            part = name.as_str(),
            mesh_elements = elements,
            "Parsed 3MF model part"
        );
    }

    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return Err(QuoteError::NoGeometry);
    }

    debug!(
        "3MF loaded: {} vertices, {} triangles from {} part(s)",
        mesh.vertex_count(),
        mesh.triangle_count(),
        part_names.len()
    );

    Ok(mesh)
}

/// Names of all model parts, in archive order
fn find_model_parts<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
) -> QuoteResult<Vec<String>> {
    let mut names = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| QuoteError::InvalidArchive {
            reason: e.to_string(),
        })?;
        if entry.is_file() && entry.name().to_ascii_lowercase().ends_with(MODEL_PART_SUFFIX) {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

/// Parser state for one model part
struct PartParser<'a> {
    part: &'a str,
    in_mesh: bool,
    in_vertices: bool,
    in_triangles: bool,
    /// Index of the first vertex of the current mesh element
    block_start: usize,
    elements: usize,
}

impl<'a> PartParser<'a> {
    fn new(part: &'a str) -> Self {
        Self {
            part,
            in_mesh: false,
            in_vertices: false,
            in_triangles: false,
            block_start: 0,
            elements: 0,
        }
    }

    fn open(&mut self, e: &BytesStart, self_closing: bool, mesh: &mut Mesh) -> QuoteResult<()> {
        match e.local_name().as_ref() {
            b"mesh" => {
                self.block_start = mesh.vertex_count();
                if self_closing {
                    self.elements += 1;
                } else {
                    self.in_mesh = true;
                }
            }
            b"vertices" if self.in_mesh => self.in_vertices = !self_closing,
            b"triangles" if self.in_mesh => self.in_triangles = !self_closing,
            b"vertex" if self.in_vertices => {
                let x: f64 = self.attr(e, b"x")?;
                let y: f64 = self.attr(e, b"y")?;
                let z: f64 = self.attr(e, b"z")?;
                mesh.add_vertex(Point3::new(x, y, z));
            }
            b"triangle" if self.in_triangles => {
                let local = [
                    self.attr::<usize>(e, b"v1")?,
                    self.attr::<usize>(e, b"v2")?,
                    self.attr::<usize>(e, b"v3")?,
                ];
                let block_len = mesh.vertex_count() - self.block_start;
                if let Some(&bad) = local.iter().find(|&&i| i >= block_len) {
                    return Err(QuoteError::malformed(
                        "3mf",
                        format!(
                            "{}: triangle references vertex {} of a {}-vertex mesh",
                            self.part, bad, block_len
                        ),
                    ));
                }
                let triangle = Triangle::new(local).offset(self.block_start);
                if !triangle.is_degenerate() {
                    mesh.add_triangle(triangle);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, local_name: &[u8]) {
        match local_name {
            b"mesh" if self.in_mesh => {
                self.in_mesh = false;
                self.in_vertices = false;
                self.in_triangles = false;
                self.elements += 1;
            }
            b"vertices" => self.in_vertices = false,
            b"triangles" => self.in_triangles = false,
            _ => {}
        }
    }

    fn attr<T: FromStr>(&self, e: &BytesStart, key: &[u8]) -> QuoteResult<T> {
        let name = String::from_utf8_lossy(key);
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                QuoteError::malformed("3mf", format!("{}: {}", self.part, err))
            })?;
            if attr.key.local_name().as_ref() != key {
                continue;
            }
            let value = attr.unescape_value().map_err(|err| {
                QuoteError::malformed("3mf", format!("{}: {}", self.part, err))
            })?;
            return value.trim().parse().map_err(|_| {
                QuoteError::malformed(
                    "3mf",
                    format!("{}: invalid {} value {:?}", self.part, name, value),
                )
            });
        }
        Err(QuoteError::malformed(
            "3mf",
            format!("{}: missing {} attribute", self.part, name),
        ))
    }
}

/// Append every mesh element of one model part; returns the element count
fn parse_model_part(xml: &str, part: &str, mesh: &mut Mesh) -> QuoteResult<usize> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parser = PartParser::new(part);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => parser.open(e, false, mesh)?,
            Ok(Event::Empty(ref e)) => parser.open(e, true, mesh)?,
            Ok(Event::End(ref e)) => parser.close(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(QuoteError::malformed(
                    "3mf",
                    format!(
                        "{}: XML error at byte {}: {}",
                        part,
                        reader.buffer_position(),
                        e
                    ),
                ));
            }
            _ => {}
        }
    }

    Ok(parser.elements)
}
