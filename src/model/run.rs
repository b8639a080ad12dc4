use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Backend identifier of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub i64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `{Metric, Value}` row of a run's overview table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewMetric {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// A saved optimization run as listed by `/get_all_runs`.
///
/// The list endpoint only carries summary fields; `overview` and
/// `route_details` stay empty until a detail fetch fills the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub buses_needed: u32,
    #[serde(default)]
    pub total_students_uploaded: Option<u32>,
    #[serde(default)]
    pub total_walkers: Option<u32>,
    #[serde(default)]
    pub total_bus_riders: Option<u32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub overview: Vec<OverviewMetric>,
    #[serde(default)]
    pub route_details: Vec<RouteDetail>,
}

/// One bus's route within a run, stops in visit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetail {
    pub route_id: Option<i64>,
    pub bus_number: u32,
    pub total_students: u32,
    pub total_distance_km: f64,
    pub estimated_duration_hr: f64,
    pub map_path: Option<String>,
    pub stops: Vec<Stop>,
}

impl RouteDetail {
    pub fn student_count(&self) -> usize {
        self.stops.iter().map(|s| s.students.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: i64,
    /// 1-based position within the route.
    pub sequence_number: u32,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Run-detail payload as returned by `/get_run/{id}` and
/// `/get_published_run`.
///
/// The two endpoints disagree on the name of the route list (`routes` vs
/// `route_details`), so both are accepted. Every field is optional so a
/// structurally thin payload still decodes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRunDetail {
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<Vec<OverviewMetric>>,
    #[serde(default)]
    pub routes: Option<Vec<RawRoute>>,
    #[serde(default)]
    pub route_details: Option<Vec<RawRoute>>,
    #[serde(default)]
    pub map_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRoute {
    #[serde(default)]
    pub route_id: Option<i64>,
    pub bus_number: u32,
    #[serde(default)]
    pub total_students: Option<u32>,
    #[serde(default)]
    pub total_distance_km: Option<f64>,
    #[serde(default)]
    pub estimated_duration_hr: Option<f64>,
    #[serde(default)]
    pub map_path: Option<String>,
    #[serde(default)]
    pub stops: Vec<RawStop>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStop {
    pub stop_id: i64,
    pub sequence_number: u32,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub students: Vec<Student>,
}

/// Latest reported position of a bus (`/bus-location/{bus}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// A student's assignment under the published plan (`/current_trip/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentTrip {
    pub student_id: String,
    pub name: String,
    #[serde(default)]
    pub is_walker: bool,
    #[serde(default)]
    pub walking_distance_km: Option<f64>,
    #[serde(default)]
    pub bus_number: Option<u32>,
    #[serde(default)]
    pub route_id: Option<i64>,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub stop: Option<TripStop>,
    #[serde(default)]
    pub route_map_path: Option<String>,
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripStop {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}
