// SPDX-License-Identifier: MIT OR Apache-2.0
//! Device-mapping table: layer -> device routing.
//!
//! Compatibility resolution (which leaf may go to which device) happens
//! downstream; the session only stores the table and invalidates the resolved
//! snapshot when it changes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Routing entry for one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Target device id
    pub device_id: String,
    /// Device-specific routing options (opaque here)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

/// Layer-id keyed mapping table, iteration order preserved
pub type Mappings = IndexMap<String, Mapping>;
