//! Core data models for the combine pipeline.
//!
//! Input records (`Region`, `Division`) mirror the cached datasets on disk
//! and carry any extra descriptive fields through untouched. Output records
//! (`RegionRecord`, `DivisionRecord`) are distinct types: a division loses
//! its `regionId`/`osm`/`geo` fields on the way out and may gain a
//! `geoshape` cache key; a region gains its `divisions` list.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Region record as read from `regions.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Division record as read from `divisions.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Division {
    #[serde(rename = "preferredName")]
    pub preferred_name: String,
    #[serde(rename = "regionId")]
    pub region_id: Value,
    #[serde(default)]
    pub osm: Option<Value>,
    #[serde(default)]
    pub geo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Division as it appears in the merged output.
#[derive(Debug, Clone, Serialize)]
pub struct DivisionRecord {
    #[serde(rename = "preferredName")]
    pub preferred_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geoshape: Option<String>,
}

/// Region as it appears in the merged output: the original fields plus
/// the divisions filed under it.
#[derive(Debug, Clone, Serialize)]
pub struct RegionRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub divisions: Vec<DivisionRecord>,
}

/// Canonical text form of a scalar JSON identifier.
///
/// The cached datasets use strings and numbers interchangeably for ids;
/// both key and format as their plain text.
pub fn id_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => bail!("expected a string or number identifier, got {}", other),
    }
}
