// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - decoding uploaded model files into meshes

mod obj;
mod stl;
mod threemf;

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::DecodedMesh;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

pub use threemf::MODEL_PART_SUFFIX;

/// Supported model file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Stl,
    #[serde(rename = "3mf")]
    ThreeMf,
    Obj,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 3] = [MeshFormat::Stl, MeshFormat::ThreeMf, MeshFormat::Obj];

    /// Recognize an extension (with or without leading dot, any case)
    pub fn from_extension(extension: &str) -> QuoteResult<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "stl" => Ok(MeshFormat::Stl),
            "3mf" => Ok(MeshFormat::ThreeMf),
            "obj" => Ok(MeshFormat::Obj),
            _ => Err(QuoteError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// Recognize the extension of a declared filename
    pub fn from_filename(filename: &str) -> QuoteResult<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::ThreeMf => "3mf",
            MeshFormat::Obj => "obj",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Decode raw bytes given a declared extension
///
/// The extension is checked before the bytes are looked at.
pub fn decode(bytes: &[u8], extension: &str) -> QuoteResult<DecodedMesh> {
    let format = MeshFormat::from_extension(extension)?;
    decode_format(bytes, format)
}

/// Decode raw bytes in a known format
///
/// Coordinates are taken as millimeters; no unit conversion is applied.
pub fn decode_format(bytes: &[u8], format: MeshFormat) -> QuoteResult<DecodedMesh> {
    debug!(%format, size = bytes.len(), "Decoding model file");
    let decoded = match format {
        MeshFormat::Stl => DecodedMesh::Single(stl::decode(bytes)?),
        MeshFormat::ThreeMf => DecodedMesh::Single(threemf::decode(bytes)?),
        MeshFormat::Obj => obj::decode(bytes)?,
    };
    debug!(fragments = decoded.fragment_count(), "Decoded model file");
    Ok(decoded)
}
