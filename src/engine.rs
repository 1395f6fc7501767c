// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Quote engine: one request from raw bytes to a priced quote

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{analyze, normalize, repair, GeometryMetrics, RepairReport};
use crate::io::{decode_format, MeshFormat};
use crate::pricing::{price, CostBreakdown, Material, QuoteConfig};
use crate::storage::{ObjectStore, StorageRef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Input of a single quote
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub bytes: Vec<u8>,
    /// Declared filename; only its extension is used for decoding
    pub filename: String,
    pub material: String,
    /// Uniform scale factor, 1.0 when absent
    pub scale: Option<f64>,
}

impl QuoteRequest {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            material: material.into(),
            scale: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Read a request from a file on disk
    pub fn from_path(path: &Path, material: impl Into<String>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(bytes, filename, material))
    }
}

/// Priced result of one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub file_name: String,
    pub format: MeshFormat,
    pub material: Material,
    pub scale: f64,
    pub metrics: GeometryMetrics,
    pub repair: RepairReport,
    pub breakdown: CostBreakdown,
    pub storage_ref: Option<StorageRef>,
}

impl Quote {
    pub fn final_price(&self) -> f64 {
        self.breakdown.final_price
    }
}

/// Geometry of a file without pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub format: MeshFormat,
    /// Number of meshes the decoder produced before merging
    pub fragments: usize,
    pub metrics: GeometryMetrics,
    pub repair: RepairReport,
}

/// Stateless quoting pipeline
///
/// Holds only immutable configuration, so one engine can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct QuoteEngine {
    config: QuoteConfig,
    store: Option<Arc<dyn ObjectStore>>,
}

impl QuoteEngine {
    pub fn new(config: QuoteConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    /// Upload each quoted file to `store`
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    /// Quote a request
    ///
    /// Request errors (material, scale, extension) are reported before the
    /// bytes are decoded. A failed upload leaves `storage_ref` empty.
    #[instrument(skip(self, request), fields(file = %request.filename, material = %request.material))]
    pub fn quote(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        let (material, scale, format) =
            check_request(&request.filename, &request.material, request.scale)?;

        let inspection = self.prepare(&request.bytes, format, scale)?;
        let breakdown = price(
            &inspection.metrics,
            &material.profile(),
            &self.config.bed,
            &self.config.pricing,
        );

        let storage_ref = self
            .store
            .as_ref()
            .and_then(|store| store.upload(&request.bytes, &request.filename));

        info!(
            price = breakdown.final_price,
            volume_cm3 = inspection.metrics.volume_cm3,
            watertight = breakdown.watertight,
            "Quoted {}",
            request.filename
        );

        Ok(Quote {
            file_name: request.filename.clone(),
            format,
            material,
            scale,
            metrics: inspection.metrics,
            repair: inspection.repair,
            breakdown,
            storage_ref,
        })
    }

    /// Decode, repair and measure a file without pricing it
    pub fn inspect(&self, bytes: &[u8], filename: &str, scale: Option<f64>) -> QuoteResult<Inspection> {
        let scale = validate_scale(scale)?;
        let format = MeshFormat::from_filename(filename)?;
        self.prepare(bytes, format, scale)
    }

    fn prepare(&self, bytes: &[u8], format: MeshFormat, scale: f64) -> QuoteResult<Inspection> {
        let decoded = decode_format(bytes, format)?;
        let fragments = decoded.fragment_count();
        let mesh = normalize(decoded)?;
        debug!(
            "Normalized {} fragment(s): {} vertices, {} triangles",
            fragments,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        let outcome = repair(mesh);
        let metrics = analyze(&outcome.mesh, scale)?;

        Ok(Inspection {
            format,
            fragments,
            metrics,
            repair: outcome.report,
        })
    }
}

impl Default for QuoteEngine {
    fn default() -> Self {
        Self::new(QuoteConfig::default())
    }
}

/// Checks that need no file contents, in the order `quote` applies them
///
/// Callers holding only a path run this before reading the file, so a
/// request with a bad material, scale or extension never touches the disk.
pub fn check_request(
    filename: &str,
    material: &str,
    scale: Option<f64>,
) -> QuoteResult<(Material, f64, MeshFormat)> {
    let material = Material::from_key(material)?;
    let scale = validate_scale(scale)?;
    let format = MeshFormat::from_filename(filename)?;
    Ok((material, scale, format))
}

fn validate_scale(scale: Option<f64>) -> QuoteResult<f64> {
    let scale = scale.unwrap_or(1.0);
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(QuoteError::InvalidScale { scale })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;

    const TETRA_OBJ: &str = "\
v 0 0 0
v 10 0 0
v 0 10 0
v 0 0 10
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

    struct RecordingStore {
        uploads: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ObjectStore for RecordingStore {
        fn upload(&self, _bytes: &[u8], filename: &str) -> Option<StorageRef> {
            self.uploads.lock().unwrap().push(filename.to_string());
            (!self.fail).then(|| StorageRef(format!("mem://{filename}")))
        }
    }

    fn request(material: &str) -> QuoteRequest {
        QuoteRequest::new(TETRA_OBJ.as_bytes().to_vec(), "tetra.obj", material)
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QuoteEngine>();
    }

    #[test]
    fn test_quote_obj() {
        let quote = QuoteEngine::default().quote(&request("petg")).unwrap();

        assert_eq!(quote.format, MeshFormat::Obj);
        assert_eq!(quote.material, Material::Petg);
        assert_eq!(quote.scale, 1.0);
        assert!(quote.metrics.watertight);
        assert!(!quote.repair.attempted);
        assert!(quote.final_price() >= 5.0);
        assert!(quote.storage_ref.is_none());
    }

    #[test]
    fn test_request_errors_come_first() {
        let engine = QuoteEngine::default();

        // garbage bytes are never decoded
        let bad = QuoteRequest::new(b"garbage".to_vec(), "part.stl", "ABS");
        assert_eq!(engine.quote(&bad).unwrap_err().kind(), ErrorKind::UnknownMaterial);

        let bad = QuoteRequest::new(b"garbage".to_vec(), "part.step", "PLA");
        assert_eq!(engine.quote(&bad).unwrap_err().kind(), ErrorKind::UnsupportedFormat);

        let bad = QuoteRequest::new(b"garbage".to_vec(), "part.stl", "PLA").with_scale(-2.0);
        assert_eq!(engine.quote(&bad).unwrap_err().kind(), ErrorKind::InvalidScale);

        let bad = QuoteRequest::new(b"garbage".to_vec(), "part.stl", "PLA");
        assert_eq!(engine.quote(&bad).unwrap_err().kind(), ErrorKind::MalformedFile);
    }

    #[test]
    fn test_check_request_needs_no_bytes() {
        let (material, scale, format) = check_request("Part.OBJ", " petg ", None).unwrap();
        assert_eq!(material, Material::Petg);
        assert_eq!(scale, 1.0);
        assert_eq!(format, MeshFormat::Obj);

        let err = check_request("part.step", "ABS", Some(0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMaterial);
        let err = check_request("part.step", "PLA", Some(0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidScale);
        let err = check_request("part.step", "PLA", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_upload_is_best_effort() {
        let store = Arc::new(RecordingStore {
            uploads: Mutex::new(Vec::new()),
            fail: false,
        });
        let engine = QuoteEngine::default().with_store(store.clone());
        let quote = engine.quote(&request("PLA")).unwrap();
        assert_eq!(quote.storage_ref, Some(StorageRef("mem://tetra.obj".into())));

        let failing = Arc::new(RecordingStore {
            uploads: Mutex::new(Vec::new()),
            fail: true,
        });
        let engine = QuoteEngine::default().with_store(failing.clone());
        let quote = engine.quote(&request("PLA")).unwrap();
        assert!(quote.storage_ref.is_none());
        assert_eq!(failing.uploads.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_upload_on_failure() {
        let store = Arc::new(RecordingStore {
            uploads: Mutex::new(Vec::new()),
            fail: false,
        });
        let engine = QuoteEngine::default().with_store(store.clone());
        assert!(engine.quote(&request("nylon")).is_err());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_inspect() {
        let inspection = QuoteEngine::default()
            .inspect(TETRA_OBJ.as_bytes(), "TETRA.OBJ", Some(2.0))
            .unwrap();
        assert_eq!(inspection.fragments, 1);
        assert_eq!(inspection.metrics.scale, 2.0);
        assert_eq!(inspection.metrics.triangle_count, 4);
    }
}
