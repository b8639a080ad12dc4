//! Output types of the feedback analytics.

use serde::Serialize;

use crate::model::{FeedbackRecord, Rating};

/// Group key for feedback without a bus number.
pub const WALKER_GROUP: &str = "Other (Walkers)";

/// Crowdedness bucket for feedback that did not report one.
pub const UNKNOWN_CROWDEDNESS: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingCount {
    pub rating: Rating,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingSplit {
    pub positive: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionCount {
    pub option: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrowdednessCount {
    pub level: String,
    pub count: usize,
}

/// Feedback for one bus (`"Bus {n}"`) or for walkers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusGroup<'a> {
    pub key: String,
    pub bus_number: Option<u32>,
    pub records: Vec<&'a FeedbackRecord>,
}

impl BusGroup<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_walkers(&self) -> bool {
        self.bus_number.is_none()
    }

    /// Average ordinal rating of this group's records.
    pub fn average_rating(&self) -> f64 {
        super::feedback::average_rating(self.records.iter().copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalkerRiderSplit<'a> {
    pub walkers: Vec<&'a FeedbackRecord>,
    pub riders: Vec<&'a FeedbackRecord>,
}
