// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Draft orders built from quotes
//!
//! The order system itself lives outside this crate; only the payload and
//! the trait boundary are defined here.

use crate::engine::Quote;
use crate::storage::StorageRef;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Customer-supplied metadata attached to an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Reference returned by the order system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRef(pub String);

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload for creating a draft order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrderRequest {
    pub title: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub customer: CustomerInfo,
    pub storage_ref: Option<StorageRef>,
    /// Technical attributes shown on the order line
    pub attributes: BTreeMap<String, String>,
}

impl DraftOrderRequest {
    pub fn from_quote(quote: &Quote, customer: CustomerInfo) -> Self {
        let b = &quote.breakdown;
        let e = &quote.metrics.extents_mm;

        let attributes: BTreeMap<String, String> = [
            ("material", quote.material.to_string()),
            ("format", quote.format.to_string()),
            ("scale", format!("{}", quote.scale)),
            ("volume_cm3", format!("{:.2}", b.bulk_volume_cm3)),
            ("weight_g", format!("{:.1}", b.weight_g)),
            ("print_time", b.print_time_label.clone()),
            ("size_mm", format!("{:.1} x {:.1} x {:.1}", e.x, e.y, e.z)),
            ("watertight", b.watertight.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            title: format!("3D print: {} ({})", quote.file_name, quote.material),
            unit_price: b.final_price,
            quantity: 1,
            customer,
            storage_ref: quote.storage_ref.clone(),
            attributes,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    pub fn total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Backend that turns a draft request into an order
pub trait OrderSystem: Send + Sync {
    fn create_draft_order(&self, request: &DraftOrderRequest) -> Result<OrderRef>;
}
