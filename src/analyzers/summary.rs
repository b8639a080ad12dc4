use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::feedback::{
    average_rating, average_wait_minutes, crowdedness_distribution, group_by_bus,
    positive_negative_split, published, rating_distribution, top_options, walker_rider_split,
};
use crate::analyzers::types::{CrowdednessCount, OptionCount, RatingCount, RatingSplit};
use crate::model::{FeedbackRecord, Vocabulary};

/// One row of the per-bus feedback table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusGroupSummary {
    pub key: String,
    pub bus_number: Option<u32>,
    pub count: usize,
    pub average_rating: f64,
}

/// Every derived figure the feedback dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub published_records: usize,
    pub average_rating: f64,
    pub split: RatingSplit,
    pub ratings: Vec<RatingCount>,
    pub top_positives: Vec<OptionCount>,
    pub top_issues: Vec<OptionCount>,
    pub crowdedness: Vec<CrowdednessCount>,
    pub buses: Vec<BusGroupSummary>,
    pub walkers: usize,
    pub riders: usize,
    pub average_wait_minutes: f64,
}

/// Flat CSV row of a [`FeedbackSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummaryRow {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub published_records: usize,
    pub average_rating: f64,
    pub positive: usize,
    pub negative: usize,
    pub walkers: usize,
    pub riders: usize,
    pub average_wait_minutes: f64,
    pub top_positive: Option<String>,
    pub top_issue: Option<String>,
    pub busiest_group: Option<String>,
}

impl FeedbackSummary {
    pub const DEFAULT_TOP_N: usize = 3;

    pub fn from_records(records: &[FeedbackRecord], vocabulary: &Vocabulary, top_n: usize) -> Self {
        let split = walker_rider_split(records);

        let buses = group_by_bus(records)
            .iter()
            .map(|g| BusGroupSummary {
                key: g.key.clone(),
                bus_number: g.bus_number,
                count: g.len(),
                average_rating: g.average_rating(),
            })
            .collect();

        FeedbackSummary {
            generated_at: Utc::now(),
            total_records: records.len(),
            published_records: published(records).count(),
            average_rating: average_rating(records),
            split: positive_negative_split(records),
            ratings: rating_distribution(records),
            top_positives: top_options(records, vocabulary.positives.as_slice(), top_n),
            top_issues: top_options(records, vocabulary.issues.as_slice(), top_n),
            crowdedness: crowdedness_distribution(records),
            buses,
            walkers: split.walkers.len(),
            riders: split.riders.len(),
            average_wait_minutes: average_wait_minutes(records),
        }
    }

    pub fn to_row(&self) -> FeedbackSummaryRow {
        FeedbackSummaryRow {
            generated_at: self.generated_at,
            total_records: self.total_records,
            published_records: self.published_records,
            average_rating: self.average_rating,
            positive: self.split.positive,
            negative: self.split.negative,
            walkers: self.walkers,
            riders: self.riders,
            average_wait_minutes: self.average_wait_minutes,
            top_positive: self.top_positives.first().map(|o| o.option.clone()),
            top_issue: self.top_issues.first().map(|o| o.option.clone()),
            busiest_group: self.buses.first().map(|b| b.key.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Crowdedness, Rating};

    fn record(bus: Option<u32>, rating: Rating, options: &[&str]) -> FeedbackRecord {
        FeedbackRecord {
            bus_number: bus,
            rating: Some(rating),
            options: options.iter().map(|s| s.to_string()).collect(),
            is_published_feedback: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_empty() {
        let summary = FeedbackSummary::from_records(&[], &Vocabulary::default(), 3);

        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.average_rating, 0.0);
        assert!(summary.ratings.is_empty());
        assert!(summary.buses.is_empty());
        assert_eq!(summary.to_row().busiest_group, None);
    }

    #[test]
    fn test_summary_figures() {
        let mut crowded = record(Some(2), Rating::Fair, &["Overcrowded", "Late pickup"]);
        crowded.crowdedness = Some(Crowdedness::High);
        let mut hidden = record(Some(5), Rating::Poor, &["Dirty bus"]);
        hidden.is_published_feedback = false;

        let records = vec![
            record(Some(2), Rating::Excellent, &["On time", "Clean bus"]),
            crowded,
            record(None, Rating::Great, &["On time"]),
            hidden,
        ];
        let summary = FeedbackSummary::from_records(&records, &Vocabulary::default(), 1);

        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.published_records, 3);
        assert!((summary.average_rating - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.split.positive, 2);
        assert_eq!(summary.split.negative, 1);
        assert_eq!(summary.top_positives[0].option, "On time");
        assert_eq!(summary.top_issues.len(), 1);
        assert_eq!(summary.top_issues[0].option, "Overcrowded");
        assert_eq!(summary.walkers, 1);
        assert_eq!(summary.riders, 2);
        assert_eq!(summary.buses[0].key, "Bus 2");
        assert_eq!(summary.buses[0].average_rating, 3.5);

        let row = summary.to_row();
        assert_eq!(row.busiest_group.as_deref(), Some("Bus 2"));
        assert_eq!(row.top_issue.as_deref(), Some("Overcrowded"));
    }
}
