//! # Region Atlas
//!
//! A batch combiner for locally cached administrative reference data.
//!
//! Region Atlas reads two cached datasets — regions and their divisions —
//! and merges them into a single nested JSON document. Each division's
//! boundary geometry ("geoshape") is resolved from OpenStreetMap or
//! Wikimedia Commons and kept in a content-addressed on-disk cache, so
//! repeated runs fetch each boundary at most once.
//!
//! ## Pipeline
//!
//! ```text
//! regions.json ───┐
//!                 ├──▶ index ──▶ enrich ──▶ data.json
//! divisions.json ─┘                │
//!                                  ▼
//!                       data/geoshape/<key>.json
//! ```
//!
//! The run is strictly sequential: one division at a time, one blocking
//! fetch at a time, and the merged document is written once at the end.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Input and output record types |
//! | [`load`] | Input collection loading |
//! | [`source`] | Geoshape source selection and cache keys |
//! | [`fetch`] | Blocking HTTP transport |
//! | [`cache`] | Content-addressed geoshape cache |
//! | [`combine`] | Pipeline orchestration |
//! | [`progress`] | Progress reporting |

pub mod cache;
pub mod combine;
pub mod config;
pub mod fetch;
pub mod load;
pub mod models;
pub mod progress;
pub mod source;
