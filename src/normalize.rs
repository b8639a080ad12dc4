//! Turns raw run-detail payloads into the in-memory route/stop/student tree
//! and resolves map URLs.

use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::model::{OverviewMetric, RawRoute, RawRunDetail, RawStop, RouteDetail, Stop};

/// Normalized run detail, ready for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedDetail {
    pub overview: Vec<OverviewMetric>,
    pub routes: Vec<RouteDetail>,
    /// Fully qualified URL of the overview map, if the run has one.
    pub map_url: Option<String>,
}

/// Which map to show: the run overview or one bus's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSelector {
    All,
    Bus(u32),
}

impl FromStr for MapSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(MapSelector::All);
        }
        s.parse::<u32>()
            .map(MapSelector::Bus)
            .map_err(|_| format!("expected \"all\" or a bus number, got {s:?}"))
    }
}

/// Resolves backend-relative asset paths against the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapResolver {
    base_url: String,
}

impl MapResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns `None` for a missing or blank path. Absolute URLs pass through.
    pub fn resolve(&self, map_path: Option<&str>) -> Option<String> {
        let path = map_path.map(str::trim).filter(|p| !p.is_empty())?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        Some(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
    }
}

/// Normalizes a raw run detail. Never fails: a payload without any route
/// list yields an empty `routes`.
pub fn normalize(raw: &RawRunDetail, resolver: &MapResolver) -> NormalizedDetail {
    let raw_routes = raw
        .routes
        .as_deref()
        .or(raw.route_details.as_deref())
        .unwrap_or_default();

    NormalizedDetail {
        overview: raw.overview.clone().unwrap_or_default(),
        routes: raw_routes.iter().map(normalize_route).collect(),
        map_url: resolver.resolve(raw.map_path.as_deref()),
    }
}

fn normalize_route(raw: &RawRoute) -> RouteDetail {
    let mut stops: Vec<&RawStop> = raw.stops.iter().collect();
    stops.sort_by_key(|s| s.sequence_number);

    let contiguous = stops
        .iter()
        .enumerate()
        .all(|(i, s)| s.sequence_number as usize == i + 1);
    if !contiguous {
        warn!(
            bus_number = raw.bus_number,
            stops = stops.len(),
            "Stop sequence is not contiguous from 1, renumbering in visit order"
        );
    }

    let stops: Vec<Stop> = stops
        .into_iter()
        .enumerate()
        .map(|(i, s)| Stop {
            stop_id: s.stop_id,
            sequence_number: i as u32 + 1,
            address: s.address.clone(),
            latitude: s.latitude.unwrap_or_default(),
            longitude: s.longitude.unwrap_or_default(),
            students: s.students.clone(),
        })
        .collect();

    let total_students = raw
        .total_students
        .unwrap_or_else(|| stops.iter().map(|s| s.students.len() as u32).sum());

    RouteDetail {
        route_id: raw.route_id,
        bus_number: raw.bus_number,
        total_students,
        total_distance_km: raw.total_distance_km.unwrap_or_default(),
        estimated_duration_hr: raw.estimated_duration_hr.unwrap_or_default(),
        map_path: raw.map_path.clone(),
        stops,
    }
}

/// Map URL for the given selector. `None` means "no map available" and is
/// rendered as a placeholder.
pub fn route_map_url(
    detail: &NormalizedDetail,
    selector: MapSelector,
    resolver: &MapResolver,
) -> Option<String> {
    match selector {
        MapSelector::All => detail.map_url.clone(),
        MapSelector::Bus(bus) => detail
            .routes
            .iter()
            .find(|r| r.bus_number == bus)
            .and_then(|r| resolver.resolve(r.map_path.as_deref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> MapResolver {
        MapResolver::new("http://localhost:8000/")
    }

    fn raw_stop(stop_id: i64, sequence_number: u32) -> RawStop {
        RawStop {
            stop_id,
            sequence_number,
            address: Some(format!("{stop_id} Elm St")),
            latitude: Some(40.5),
            longitude: Some(-74.6),
            students: vec![],
        }
    }

    fn raw_route(bus_number: u32, map_path: Option<&str>) -> RawRoute {
        RawRoute {
            route_id: Some(bus_number as i64 * 10),
            bus_number,
            total_students: Some(0),
            total_distance_km: Some(3.2),
            estimated_duration_hr: None,
            map_path: map_path.map(str::to_string),
            stops: vec![raw_stop(1, 1), raw_stop(2, 2)],
        }
    }

    #[test]
    fn test_missing_route_lists_normalize_to_empty() {
        let raw = RawRunDetail {
            overview: Some(vec![OverviewMetric {
                metric: "Buses".to_string(),
                value: 2.0,
            }]),
            ..Default::default()
        };
        let detail = normalize(&raw, &resolver());

        assert!(detail.routes.is_empty());
        assert_eq!(detail.overview.len(), 1);
        assert_eq!(detail.map_url, None);
    }

    #[test]
    fn test_route_details_is_synonym_for_routes() {
        let raw = RawRunDetail {
            route_details: Some(vec![raw_route(1, None), raw_route(2, None)]),
            ..Default::default()
        };
        let detail = normalize(&raw, &resolver());

        let buses: Vec<u32> = detail.routes.iter().map(|r| r.bus_number).collect();
        assert_eq!(buses, vec![1, 2]);
        assert_eq!(detail.routes[0].estimated_duration_hr, 0.0);
    }

    #[test]
    fn test_overview_order_preserved() {
        let metrics = vec![
            OverviewMetric {
                metric: "Zeta".to_string(),
                value: 1.0,
            },
            OverviewMetric {
                metric: "Alpha".to_string(),
                value: 2.0,
            },
        ];
        let raw = RawRunDetail {
            overview: Some(metrics.clone()),
            ..Default::default()
        };
        assert_eq!(normalize(&raw, &resolver()).overview, metrics);
    }

    #[test]
    fn test_stops_sorted_and_renumbered() {
        let mut route = raw_route(5, None);
        route.stops = vec![raw_stop(30, 7), raw_stop(10, 2), raw_stop(20, 4)];
        let raw = RawRunDetail {
            routes: Some(vec![route]),
            ..Default::default()
        };
        let detail = normalize(&raw, &resolver());

        let stops = &detail.routes[0].stops;
        let ids: Vec<i64> = stops.iter().map(|s| s.stop_id).collect();
        let seq: Vec<u32> = stops.iter().map(|s| s.sequence_number).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(seq, vec![1, 2, 3]);
    }

    #[test]
    fn test_overview_map_url_resolved() {
        let raw = RawRunDetail {
            map_path: Some("assets/maps/run_4.html".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalize(&raw, &resolver()).map_url.as_deref(),
            Some("http://localhost:8000/assets/maps/run_4.html")
        );
    }

    #[test]
    fn test_resolver_passes_absolute_and_drops_blank() {
        let r = resolver();
        assert_eq!(
            r.resolve(Some("https://cdn.example.org/m.html")).as_deref(),
            Some("https://cdn.example.org/m.html")
        );
        assert_eq!(r.resolve(Some("   ")), None);
        assert_eq!(r.resolve(None), None);
    }

    #[test]
    fn test_route_map_url_selection() {
        let raw = RawRunDetail {
            routes: Some(vec![
                raw_route(1, Some("/assets/individual_maps/bus_1.html")),
                raw_route(2, None),
            ]),
            map_path: Some("assets/all.html".to_string()),
            ..Default::default()
        };
        let r = resolver();
        let detail = normalize(&raw, &r);

        assert_eq!(
            route_map_url(&detail, MapSelector::All, &r).as_deref(),
            Some("http://localhost:8000/assets/all.html")
        );
        assert_eq!(
            route_map_url(&detail, MapSelector::Bus(1), &r).as_deref(),
            Some("http://localhost:8000/assets/individual_maps/bus_1.html")
        );
        assert_eq!(route_map_url(&detail, MapSelector::Bus(2), &r), None);
        assert_eq!(route_map_url(&detail, MapSelector::Bus(99), &r), None);
    }

    #[test]
    fn test_all_selector_without_overview_map() {
        let detail = NormalizedDetail::default();
        assert_eq!(route_map_url(&detail, MapSelector::All, &resolver()), None);
    }

    #[test]
    fn test_map_selector_parse() {
        assert_eq!("all".parse::<MapSelector>(), Ok(MapSelector::All));
        assert_eq!("ALL".parse::<MapSelector>(), Ok(MapSelector::All));
        assert_eq!("12".parse::<MapSelector>(), Ok(MapSelector::Bus(12)));
        assert!("bus".parse::<MapSelector>().is_err());
    }
}
