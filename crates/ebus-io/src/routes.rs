//! Bus route JSON.
//!
//! ```json
//! [
//!   {
//!     "line": "39A",
//!     "buses": [
//!       {
//!         "bus": 101,
//!         "path": [
//!           { "time": "07:05", "station_id": 0 },
//!           { "time": "07:40", "station_id": 3, "rest": true },
//!           { "time": "08:20", "station_id": 0 }
//!         ]
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! A stop carrying a `rest` key is a driver layover, whatever its value.
//! Lines listed in the exclusion list are skipped.

use std::io::Read;
use std::path::Path;

use ebus_core::{BusKey, BusRoute, SchedResult, StationId};
use serde::Deserialize;
use tracing::debug;

use crate::time::parse_clock;
use crate::{in_file, open};

#[derive(Debug, Deserialize)]
struct LineRecord {
    line: String,
    buses: Vec<BusRecord>,
}

#[derive(Debug, Deserialize)]
struct BusRecord {
    bus: i64,
    path: Vec<StopRecord>,
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    time: String,
    station_id: usize,
    #[serde(default, deserialize_with = "present")]
    rest: bool,
}

/// Maps any value, `null` included, to `true`; an absent key stays `false`.
fn present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::de::IgnoredAny::deserialize(deserializer).map(|_| true)
}

/// Read bus routes from `path`, skipping `excluded_lines`.
pub fn read_routes(path: &Path, excluded_lines: &[String]) -> SchedResult<Vec<BusRoute>> {
    let mut text = String::new();
    open(path)?.read_to_string(&mut text)?;
    parse_routes(&text, excluded_lines).map_err(|e| in_file(path, e))
}

/// Parse bus routes from JSON text, skipping `excluded_lines`.
///
/// Station indices and times are not range-checked here; that happens when
/// the routes are assembled into a schedule input.
pub fn parse_routes(json: &str, excluded_lines: &[String]) -> SchedResult<Vec<BusRoute>> {
    let lines: Vec<LineRecord> = serde_json::from_str(json)?;

    let mut routes = Vec::new();
    let mut skipped = 0;
    for line in lines {
        if excluded_lines.contains(&line.line) {
            skipped += line.buses.len();
            continue;
        }
        for bus in line.buses {
            let mut stops = Vec::with_capacity(bus.path.len());
            let mut scheduled = Vec::with_capacity(bus.path.len());
            let mut rests = Vec::with_capacity(bus.path.len());
            for stop in bus.path {
                stops.push(StationId::new(stop.station_id));
                scheduled.push(parse_clock(&stop.time)?);
                rests.push(stop.rest);
            }
            routes.push(BusRoute::new(BusKey::new(bus.bus), stops, scheduled, rests));
        }
    }

    debug!(buses = routes.len(), skipped, "loaded bus routes");
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebus_core::SchedError;

    const ROUTES: &str = r#"[
        {"line": "39A", "buses": [
            {"bus": 7, "path": [
                {"time": "07:00", "station_id": 0},
                {"time": "07:30", "station_id": 1, "rest": null},
                {"time": "00:00", "station_id": 0}
            ]}
        ]},
        {"line": "350-1", "buses": [
            {"bus": 9, "path": [{"time": "09:00", "station_id": 1}]}
        ]}
    ]"#;

    #[test]
    fn test_parse_routes() {
        let routes = parse_routes(ROUTES, &[]).unwrap();
        assert_eq!(routes.len(), 2);

        let route = &routes[0];
        assert_eq!(route.key, BusKey(7));
        assert_eq!(route.stops, vec![StationId(0), StationId(1), StationId(0)]);
        assert_eq!(route.scheduled, vec![7.0, 7.5, 24.0]);
        assert_eq!(route.rests, vec![false, true, false]);
    }

    #[test]
    fn test_excluded_lines_are_skipped() {
        let routes = parse_routes(ROUTES, &["350-1".to_string()]).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].key, BusKey(7));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_routes(r#"[{"line": "1"}]"#, &[]).unwrap_err();
        assert!(matches!(err, SchedError::Parse(_)));
        let err = parse_routes(
            r#"[{"line": "1", "buses": [{"bus": 1, "path": [{"time": "7h", "station_id": 0}]}]}]"#,
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SchedError::Parse(_)));
    }
}
