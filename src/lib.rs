// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Printquote
//!
//! Mesh ingestion and cost estimation for 3D printing. Uploaded STL, 3MF and
//! OBJ files are decoded into one indexed mesh, repaired toward a closed
//! solid, measured, and priced against a material table and a printer bed.

pub mod batch;
pub mod cli;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod io;
pub mod order;
pub mod pricing;
pub mod storage;

pub use engine::{check_request, Inspection, Quote, QuoteEngine, QuoteRequest};
pub use error::{ErrorKind, QuoteError, QuoteResult};
pub use geometry::{GeometryMetrics, Mesh, RepairReport};
pub use io::MeshFormat;
pub use pricing::{CostBreakdown, Material, MaterialProfile, PricingConstants, PrintBedSpec, QuoteConfig};
pub use storage::{LocalObjectStore, ObjectStore, StorageRef};

/// Quote a file with the default configuration
pub fn quote_bytes(bytes: &[u8], filename: &str, material: &str) -> QuoteResult<Quote> {
    QuoteEngine::default().quote(&QuoteRequest::new(bytes.to_vec(), filename, material))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_bytes() {
        let obj = "v 0 0 0\nv 10 0 0\nv 0 10 0\nv 0 0 10\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n";
        let quote = quote_bytes(obj.as_bytes(), "tetra.obj", "PLA").unwrap();
        assert!(quote.final_price() >= 5.0);
    }
}
