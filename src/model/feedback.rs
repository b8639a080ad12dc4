use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::RunId;

/// Rider rating, declared in canonical (ascending) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    Poor,
    Fair,
    Good,
    Great,
    Excellent,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::Poor,
        Rating::Fair,
        Rating::Good,
        Rating::Great,
        Rating::Excellent,
    ];

    /// Position on the 1..=5 ordinal scale used for averaging.
    pub fn ordinal(self) -> u8 {
        match self {
            Rating::Poor => 1,
            Rating::Fair => 2,
            Rating::Good => 3,
            Rating::Great => 4,
            Rating::Excellent => 5,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Rating::Good | Rating::Great | Rating::Excellent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Poor => "Poor",
            Rating::Fair => "Fair",
            Rating::Good => "Good",
            Rating::Great => "Great",
            Rating::Excellent => "Excellent",
        }
    }

    pub fn parse(s: &str) -> Option<Rating> {
        Rating::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crowdedness {
    Low,
    Moderate,
    High,
}

impl Crowdedness {
    pub fn as_str(self) -> &'static str {
        match self {
            Crowdedness::Low => "Low",
            Crowdedness::Moderate => "Moderate",
            Crowdedness::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Crowdedness> {
        [Crowdedness::Low, Crowdedness::Moderate, Crowdedness::High]
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraMetadata {
    #[serde(default)]
    pub is_walker: bool,
}

/// One row of `/feedback/all`.
///
/// Unpublished rows come back with most fields nulled; they still decode and
/// are filtered out by `is_published_feedback` before any aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(default)]
    pub feedback_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<i64>,
    #[serde(default)]
    pub run_id: Option<RunId>,
    /// Absent for walkers.
    #[serde(default)]
    pub bus_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<Rating>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub boarding_time: Option<String>,
    /// Minutes waited at the stop.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub wait_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_crowdedness")]
    pub crowdedness: Option<Crowdedness>,
    #[serde(default)]
    pub is_published_feedback: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra_metadata: ExtraMetadata,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
}

impl FeedbackRecord {
    /// Structural walker signal: no bus number. `extra_metadata.is_walker`
    /// is informational only.
    pub fn is_walker(&self) -> bool {
        self.bus_number.is_none()
    }
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<Rating>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Rating::parse))
}

fn lenient_crowdedness<'de, D>(deserializer: D) -> Result<Option<Crowdedness>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Crowdedness::parse))
}

// The backend stores wait_time as text, so both `7` and `"7"` occur.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|m| m.is_finite()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D>(deserializer: D) -> Result<ExtraMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ExtraMetadata>::deserialize(deserializer)?.unwrap_or_default())
}

pub const POSITIVE_OPTIONS: &[&str] = &[
    "On time",
    "Friendly driver",
    "Clean bus",
    "Safe driving",
    "Comfortable ride",
    "Easy pickup location",
];

pub const ISSUE_OPTIONS: &[&str] = &[
    "Late pickup",
    "Late drop-off",
    "Overcrowded",
    "Unsafe driving",
    "Missed stop",
    "Rude behavior",
    "Dirty bus",
];

/// The fixed tag lists a rider picks `options` from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub positives: Vec<String>,
    pub issues: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            positives: POSITIVE_OPTIONS.iter().map(|s| s.to_string()).collect(),
            issues: ISSUE_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Vocabulary {
    pub fn contains(&self, option: &str) -> bool {
        self.is_positive(option) || self.is_issue(option)
    }

    pub fn is_positive(&self, option: &str) -> bool {
        self.positives.iter().any(|p| p == option)
    }

    pub fn is_issue(&self, option: &str) -> bool {
        self.issues.iter().any(|i| i == option)
    }
}
