//! Geoshape source selection and content addressing.
//!
//! Each division may point at its boundary geometry in one of two places:
//! an OpenStreetMap relation (`osm`) or a Wikimedia Commons map data page
//! (`geo`). The [`GeoSource`] variant fixes both the URL to fetch and how
//! the response body becomes the cached payload. The cache key is derived
//! from the URL alone, so identical sources land on the same cache entry
//! across runs.

use anyhow::{Context, Result};
use md5::{Digest, Md5};
use serde_json::Value;

use crate::models::{id_text, Division};

const OSM_ENDPOINT: &str = "https://polygons.openstreetmap.fr/get_geojson.py";
const COMMONS_ENDPOINT: &str = "https://commons.wikimedia.org/w/index.php";
const COMMONS_DATA_PREFIX: &str = "http://commons.wikimedia.org/data/main/";

/// A resolved geoshape source for one division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoSource {
    /// OpenStreetMap polygon export for a relation id. The response body
    /// is GeoJSON and is stored verbatim.
    Osm { relation: String },
    /// Wikimedia Commons map data page. The response is a JSON envelope;
    /// only its `data` field is stored.
    Wikidata { title: String },
}

impl GeoSource {
    /// Select the source for a division. `osm` wins over `geo`; a division
    /// with neither has no source.
    pub fn resolve(division: &Division) -> Result<Option<GeoSource>> {
        if let Some(osm) = &division.osm {
            let relation = id_text(osm).with_context(|| {
                format!("division '{}' has a malformed osm id", division.preferred_name)
            })?;
            return Ok(Some(GeoSource::Osm { relation }));
        }
        if let Some(geo) = &division.geo {
            let title = geo.strip_prefix(COMMONS_DATA_PREFIX).unwrap_or(geo);
            return Ok(Some(GeoSource::Wikidata {
                title: title.to_string(),
            }));
        }
        Ok(None)
    }

    /// The URL this source is fetched from.
    pub fn url(&self) -> String {
        match self {
            GeoSource::Osm { relation } => format!("{}?id={}", OSM_ENDPOINT, relation),
            GeoSource::Wikidata { title } => format!(
                "{}?action=raw&format=json&origin=*&title={}",
                COMMONS_ENDPOINT, title
            ),
        }
    }

    /// Content-addressed cache key for this source.
    pub fn cache_key(&self) -> String {
        cache_key_for(&self.url())
    }

    /// Turn a fetched response body into the bytes persisted in the cache.
    pub fn payload(&self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            GeoSource::Osm { .. } => Ok(body.to_vec()),
            GeoSource::Wikidata { title } => {
                let envelope: Value = serde_json::from_slice(body)
                    .with_context(|| format!("map data page '{}' is not valid JSON", title))?;
                let data = envelope
                    .get("data")
                    .with_context(|| format!("map data page '{}' has no data field", title))?;
                Ok(serde_json::to_vec(data)?)
            }
        }
    }
}

/// First 8 hex characters of the MD5 of the URL.
pub fn cache_key_for(url: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..8].to_string()
}
