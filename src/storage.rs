// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Object storage for uploaded model files
//!
//! Uploads are best-effort: a store that fails returns `None` and the quote
//! is produced without a storage reference.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Opaque reference returned by a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRef(pub String);

impl StorageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination for the original model bytes
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a name derived from `filename`; `None` on failure
    fn upload(&self, bytes: &[u8], filename: &str) -> Option<StorageRef>;
}

/// Content-addressed store in a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<sha256 prefix>-<sanitized filename>`
    pub fn object_key(bytes: &[u8], filename: &str) -> String {
        let digest = Sha256::digest(bytes);
        let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        format!("{}-{}", hex, sanitize_filename(filename))
    }
}

impl ObjectStore for LocalObjectStore {
    fn upload(&self, bytes: &[u8], filename: &str) -> Option<StorageRef> {
        let key = Self::object_key(bytes, filename);
        let path = self.root.join(&key);

        let result = std::fs::create_dir_all(&self.root).and_then(|_| std::fs::write(&path, bytes));
        match result {
            Ok(()) => {
                debug!("Stored {} bytes at {}", bytes.len(), path.display());
                Some(StorageRef(path.display().to_string()))
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", filename, e);
                None
            }
        }
    }
}

/// Keep the final path component, replacing anything outside `[A-Za-z0-9._-]`
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "model".to_string()
    } else {
        cleaned.to_string()
    }
}
