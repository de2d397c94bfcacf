//! Combine pipeline orchestration.
//!
//! Coordinates the full run: load inputs → index regions → enrich divisions
//! (resolving and caching geoshapes) → write the merged document. Strictly
//! sequential; the output file is written once, at the very end, so an
//! aborted run leaves no partial document behind.

use anyhow::{Context, Result};
use serde_json::Map;
use std::collections::BTreeMap;
use std::path::Path;

use crate::cache::GeoshapeCache;
use crate::config::Config;
use crate::fetch::Fetch;
use crate::load;
use crate::models::{id_text, Division, DivisionRecord, Region, RegionRecord};
use crate::progress::{CombineEvent, CombineReporter};
use crate::source::GeoSource;

pub fn run_combine(
    config: &Config,
    transport: &dyn Fetch,
    reporter: &dyn CombineReporter,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let regions = load::load_regions(&config.inputs.regions)?;
    let mut divisions = load::load_divisions(&config.inputs.divisions)?;

    if let Some(lim) = limit {
        divisions.truncate(lim);
    }

    let cache = GeoshapeCache::new(config.geoshape.dir.clone());

    if dry_run {
        return dry_run_report(&divisions, &cache);
    }

    let mut regions_map = index_regions(regions)?;

    let total = divisions.len();
    let mut fetched = 0u64;
    let mut cache_hits = 0u64;
    let mut without_source = 0u64;

    for (i, division) in divisions.into_iter().enumerate() {
        reporter.report(CombineEvent::Division {
            n: i + 1,
            total,
            name: division.preferred_name.clone(),
        });

        let geoshape = match GeoSource::resolve(&division)? {
            Some(source) => {
                let key = source.cache_key();
                if cache.contains(&key) {
                    cache_hits += 1;
                } else {
                    let url = source.url();
                    reporter.report(CombineEvent::Fetching { url: url.clone() });
                    let body = transport.get(&url)?;
                    let payload = source.payload(&body)?;
                    cache.store(&key, &payload)?;
                    fetched += 1;
                }
                Some(key)
            }
            None => {
                reporter.report(CombineEvent::NoGeoshape);
                without_source += 1;
                None
            }
        };

        let region_key = id_text(&division.region_id).with_context(|| {
            format!(
                "division '{}' has a malformed regionId",
                division.preferred_name
            )
        })?;
        let region = regions_map.get_mut(&region_key).ok_or_else(|| {
            anyhow::anyhow!(
                "division '{}' references unknown region '{}'",
                division.preferred_name,
                region_key
            )
        })?;
        region.divisions.push(DivisionRecord {
            preferred_name: division.preferred_name,
            extra: division.extra,
            geoshape,
        });
    }

    write_output(&config.output.path, &regions_map)?;

    println!("combine");
    println!("  regions: {}", regions_map.len());
    println!("  divisions: {}", total);
    println!("  fetched: {}", fetched);
    println!("  cache hits: {}", cache_hits);
    if without_source > 0 {
        println!("  without geoshape: {}", without_source);
    }
    println!("ok");

    Ok(())
}

/// Build the region-id → output record mapping with empty division lists.
pub fn index_regions(regions: Vec<Region>) -> Result<BTreeMap<String, RegionRecord>> {
    let mut map = BTreeMap::new();
    for region in regions {
        let key = id_text(&region.id).context("region record has a malformed id")?;
        let mut fields = Map::new();
        fields.insert("id".to_string(), region.id);
        fields.extend(region.extra);
        map.insert(
            key,
            RegionRecord {
                fields,
                divisions: Vec::new(),
            },
        );
    }
    Ok(map)
}

/// Serialize the merged document with 2-space indentation, overwriting
/// any previous output.
fn write_output(path: &Path, regions: &BTreeMap<String, RegionRecord>) -> Result<()> {
    let json = serde_json::to_string_pretty(regions)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;

    Ok(())
}

fn dry_run_report(divisions: &[Division], cache: &GeoshapeCache) -> Result<()> {
    let mut resolved = 0usize;
    let mut hits = 0usize;
    let mut pending = 0usize;

    for division in divisions {
        if let Some(source) = GeoSource::resolve(division)? {
            resolved += 1;
            if cache.contains(&source.cache_key()) {
                hits += 1;
            } else {
                pending += 1;
            }
        }
    }

    println!("combine (dry-run)");
    println!("  divisions: {}", divisions.len());
    println!("  geoshape sources: {}", resolved);
    println!("  cached: {}", hits);
    println!("  to fetch: {}", pending);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GeoshapeConfig, InputsConfig, OutputConfig};
    use crate::progress::NoProgress;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct StubFetch {
        responses: HashMap<String, Vec<u8>>,
        calls: RefCell<Vec<String>>,
    }

    impl StubFetch {
        fn new(responses: &[(&str, &[u8])]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_vec()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetch for StubFetch {
        fn get(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unexpected URL: {}", url))
        }
    }

    fn test_config(root: &Path) -> Config {
        Config {
            inputs: InputsConfig {
                regions: root.join("regions.json"),
                divisions: root.join("divisions.json"),
            },
            geoshape: GeoshapeConfig {
                dir: root.join("geoshape"),
            },
            output: OutputConfig {
                path: root.join("data.json"),
            },
            fetch: Default::default(),
        }
    }

    fn write_inputs(root: &Path, regions: Value, divisions: Value) {
        std::fs::write(
            root.join("regions.json"),
            serde_json::to_string(&regions).unwrap(),
        )
        .unwrap();
        std::fs::write(
            root.join("divisions.json"),
            serde_json::to_string(&divisions).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_full_run_nests_and_caches() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": "R1", "name": "North"}, {"id": "R2"}]),
            json!([
                {"preferredName": "Alpha", "regionId": "R1", "osm": "12345", "geo": null},
                {"preferredName": "Beta", "regionId": "R1", "osm": null,
                 "geo": "http://commons.wikimedia.org/data/main/Foo.map"},
                {"preferredName": "Gamma", "regionId": "R2", "osm": null, "geo": null}
            ]),
        );

        let osm_body = br#"{"type": "FeatureCollection", "features": []}"#;
        let wikidata_body =
            serde_json::to_vec(&json!({"license": "CC0-1.0", "data": {"type": "Point"}})).unwrap();
        let transport = StubFetch::new(&[
            (
                "https://polygons.openstreetmap.fr/get_geojson.py?id=12345",
                osm_body.as_slice(),
            ),
            (
                "https://commons.wikimedia.org/w/index.php?action=raw&format=json&origin=*&title=Foo.map",
                wikidata_body.as_slice(),
            ),
        ]);

        run_combine(&config, &transport, &NoProgress, false, None).unwrap();

        assert_eq!(transport.calls.borrow().len(), 2);

        // OSM response is cached verbatim; Wikidata entry holds only the data field.
        assert_eq!(
            std::fs::read(tmp.path().join("geoshape/2e076db4.json")).unwrap(),
            osm_body.to_vec()
        );
        let wikidata_entry: Value =
            serde_json::from_slice(&std::fs::read(tmp.path().join("geoshape/9187fbf8.json")).unwrap())
                .unwrap();
        assert_eq!(wikidata_entry, json!({"type": "Point"}));

        let output: Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("data.json")).unwrap())
                .unwrap();
        assert_eq!(output["R1"]["name"], json!("North"));
        assert_eq!(
            output["R1"]["divisions"],
            json!([
                {"preferredName": "Alpha", "geoshape": "2e076db4"},
                {"preferredName": "Beta", "geoshape": "9187fbf8"}
            ])
        );
        assert_eq!(output["R2"]["divisions"], json!([{"preferredName": "Gamma"}]));
    }

    #[test]
    fn test_second_run_fetches_nothing_and_matches() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": "R1"}]),
            json!([{"preferredName": "Alpha", "regionId": "R1", "osm": "12345", "geo": null}]),
        );

        let transport = StubFetch::new(&[(
            "https://polygons.openstreetmap.fr/get_geojson.py?id=12345",
            br#"{"type": "FeatureCollection"}"#.as_slice(),
        )]);

        run_combine(&config, &transport, &NoProgress, false, None).unwrap();
        let first = std::fs::read(tmp.path().join("data.json")).unwrap();

        run_combine(&config, &transport, &NoProgress, false, None).unwrap();
        let second = std::fs::read(tmp.path().join("data.json")).unwrap();

        assert_eq!(transport.calls.borrow().len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_fetch_for_divisions_without_source() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": "R1"}]),
            json!([{"preferredName": "Gamma", "regionId": "R1", "osm": null, "geo": null}]),
        );

        let transport = StubFetch::new(&[]);
        run_combine(&config, &transport, &NoProgress, false, None).unwrap();

        assert!(transport.calls.borrow().is_empty());
        assert!(!tmp.path().join("geoshape").exists());

        let output: Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("data.json")).unwrap())
                .unwrap();
        assert_eq!(output["R1"]["divisions"][0], json!({"preferredName": "Gamma"}));
    }

    #[test]
    fn test_unknown_region_is_fatal_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": "R1"}]),
            json!([{"preferredName": "Alpha", "regionId": "R9", "osm": null, "geo": null}]),
        );

        let transport = StubFetch::new(&[]);
        let err = run_combine(&config, &transport, &NoProgress, false, None).unwrap_err();
        assert!(err.to_string().contains("unknown region 'R9'"));
        assert!(!tmp.path().join("data.json").exists());
    }

    #[test]
    fn test_numeric_region_ids() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": 7}]),
            json!([{"preferredName": "Alpha", "regionId": 7, "osm": null, "geo": null}]),
        );

        let transport = StubFetch::new(&[]);
        run_combine(&config, &transport, &NoProgress, false, None).unwrap();

        let output: Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("data.json")).unwrap())
                .unwrap();
        assert_eq!(output["7"]["divisions"][0]["preferredName"], json!("Alpha"));
    }

    #[test]
    fn test_limit_truncates() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": "R1"}]),
            json!([
                {"preferredName": "Alpha", "regionId": "R1", "osm": null, "geo": null},
                {"preferredName": "Beta", "regionId": "R1", "osm": null, "geo": null}
            ]),
        );

        let transport = StubFetch::new(&[]);
        run_combine(&config, &transport, &NoProgress, false, Some(1)).unwrap();

        let output: Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("data.json")).unwrap())
                .unwrap();
        assert_eq!(output["R1"]["divisions"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_inputs(
            tmp.path(),
            json!([{"id": "R1"}]),
            json!([{"preferredName": "Alpha", "regionId": "R1", "osm": "12345", "geo": null}]),
        );

        let transport = StubFetch::new(&[]);
        run_combine(&config, &transport, &NoProgress, true, None).unwrap();

        assert!(transport.calls.borrow().is_empty());
        assert!(!tmp.path().join("data.json").exists());
        assert!(!tmp.path().join("geoshape").exists());
    }

    #[test]
    fn test_index_regions_keys_and_fields() {
        let regions: Vec<Region> = serde_json::from_value(json!([
            {"id": "R1", "name": "North"},
            {"id": 2, "name": "South"}
        ]))
        .unwrap();

        let map = index_regions(regions).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["R1"].fields["name"], json!("North"));
        assert_eq!(map["R1"].fields["id"], json!("R1"));
        assert!(map["2"].divisions.is_empty());
    }
}
