use std::collections::HashMap;

use crate::analyzers::types::{
    BusGroup, CrowdednessCount, OptionCount, RatingCount, RatingSplit, UNKNOWN_CROWDEDNESS,
    WALKER_GROUP, WalkerRiderSplit,
};
use crate::analyzers::utility::{mean, ordered_tally};
use crate::model::{FeedbackRecord, Rating};

/// The published-only subset, in input order.
pub fn published<'a, I>(records: I) -> impl Iterator<Item = &'a FeedbackRecord>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records.into_iter().filter(|r| r.is_published_feedback)
}

/// Count per rating, in canonical Poor..Excellent order. Ratings that never
/// occur are left out.
pub fn rating_distribution<'a, I>(records: I) -> Vec<RatingCount>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut counts = [0usize; Rating::ALL.len()];
    for rating in published(records).filter_map(|r| r.rating) {
        counts[rating.ordinal() as usize - 1] += 1;
    }

    Rating::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(rating, count)| RatingCount { rating, count })
        .collect()
}

/// Mean ordinal rating (Poor = 1 .. Excellent = 5). Records without a
/// recognised rating count toward the denominator but add 0. Empty input
/// gives 0.0.
pub fn average_rating<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let (sum, count) = published(records).fold((0u64, 0usize), |(sum, count), r| {
        let score = r.rating.map(|rating| rating.ordinal() as u64).unwrap_or(0);
        (sum + score, count + 1)
    });
    sum as f64 / count.max(1) as f64
}

/// Positive = Good/Great/Excellent, negative = Fair/Poor. Unrated records
/// fall in neither bucket.
pub fn positive_negative_split<'a, I>(records: I) -> RatingSplit
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    published(records)
        .filter_map(|r| r.rating)
        .fold(RatingSplit::default(), |mut split, rating| {
            if rating.is_positive() {
                split.positive += 1;
            } else {
                split.negative += 1;
            }
            split
        })
}

/// The `n` most frequent tags drawn from `vocabulary`.
///
/// Sorted by count descending; equal counts keep the order in which the tags
/// were first encountered. A tag repeated within one record counts once.
pub fn top_options<'a, I, S>(records: I, vocabulary: &[S], n: usize) -> Vec<OptionCount>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
    S: AsRef<str>,
{
    let in_vocabulary = |option: &str| vocabulary.iter().any(|v| v.as_ref() == option);

    let tags = published(records).flat_map(|r| {
        let mut seen: Vec<&str> = Vec::with_capacity(r.options.len());
        for option in &r.options {
            let option = option.as_str();
            if in_vocabulary(option) && !seen.contains(&option) {
                seen.push(option);
            }
        }
        seen
    });

    let mut tally = ordered_tally(tags);
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally.truncate(n);

    tally
        .into_iter()
        .map(|(option, count)| OptionCount {
            option: option.to_string(),
            count,
        })
        .collect()
}

/// Count per crowdedness level in first-encounter order; unreported levels
/// are counted as `"Unknown"`.
pub fn crowdedness_distribution<'a, I>(records: I) -> Vec<CrowdednessCount>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let levels = published(records).map(|r| {
        r.crowdedness
            .map(|c| c.as_str())
            .unwrap_or(UNKNOWN_CROWDEDNESS)
    });

    ordered_tally(levels)
        .into_iter()
        .map(|(level, count)| CrowdednessCount {
            level: level.to_string(),
            count,
        })
        .collect()
}

/// Groups feedback by `"Bus {n}"`, with bus-less records under
/// `"Other (Walkers)"`. Largest group first; equal sizes keep first-encounter
/// order.
pub fn group_by_bus<'a, I>(records: I) -> Vec<BusGroup<'a>>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut groups: Vec<BusGroup<'a>> = Vec::new();
    let mut index: HashMap<Option<u32>, usize> = HashMap::new();

    for record in published(records) {
        let slot = *index.entry(record.bus_number).or_insert_with(|| {
            groups.push(BusGroup {
                key: group_key(record.bus_number),
                bus_number: record.bus_number,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups
}

pub fn group_key(bus_number: Option<u32>) -> String {
    match bus_number {
        Some(n) => format!("Bus {n}"),
        None => WALKER_GROUP.to_string(),
    }
}

/// Splits feedback on the presence of `bus_number`. The
/// `extra_metadata.is_walker` flag does not affect the split.
pub fn walker_rider_split<'a, I>(records: I) -> WalkerRiderSplit<'a>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let (walkers, riders): (Vec<_>, Vec<_>) = published(records).partition(|r| r.is_walker());
    WalkerRiderSplit { walkers, riders }
}

/// Mean reported wait in minutes over records that report one.
pub fn average_wait_minutes<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let waits: Vec<f64> = published(records).filter_map(|r| r.wait_time).collect();
    mean(&waits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Crowdedness, ExtraMetadata};

    fn rated(rating: Rating) -> FeedbackRecord {
        FeedbackRecord {
            rating: Some(rating),
            is_published_feedback: true,
            ..Default::default()
        }
    }

    fn on_bus(bus: Option<u32>) -> FeedbackRecord {
        FeedbackRecord {
            bus_number: bus,
            is_published_feedback: true,
            ..Default::default()
        }
    }

    fn tagged(options: &[&str]) -> FeedbackRecord {
        FeedbackRecord {
            options: options.iter().map(|s| s.to_string()).collect(),
            is_published_feedback: true,
            ..Default::default()
        }
    }

    fn unpublished(mut record: FeedbackRecord) -> FeedbackRecord {
        record.is_published_feedback = false;
        record
    }

    #[test]
    fn test_average_rating_empty_is_zero() {
        assert_eq!(average_rating(&[] as &[FeedbackRecord]), 0.0);
    }

    #[test]
    fn test_average_and_split_scenario() {
        let records = vec![
            rated(Rating::Excellent),
            rated(Rating::Poor),
            rated(Rating::Good),
        ];

        assert_eq!(average_rating(&records), 3.0);
        assert_eq!(
            positive_negative_split(&records),
            RatingSplit {
                positive: 2,
                negative: 1
            }
        );
    }

    #[test]
    fn test_missing_rating_counts_as_zero_in_average() {
        let records = vec![rated(Rating::Excellent), FeedbackRecord {
            is_published_feedback: true,
            ..Default::default()
        }];
        assert_eq!(average_rating(&records), 2.5);
        assert_eq!(
            positive_negative_split(&records),
            RatingSplit {
                positive: 1,
                negative: 0
            }
        );
    }

    #[test]
    fn test_unpublished_records_excluded_everywhere() {
        let records = vec![
            rated(Rating::Great),
            unpublished(rated(Rating::Poor)),
            unpublished(tagged(&["On time"])),
            unpublished(on_bus(Some(7))),
        ];

        assert_eq!(average_rating(&records), 4.0);
        assert_eq!(
            rating_distribution(&records),
            vec![RatingCount {
                rating: Rating::Great,
                count: 1
            }]
        );
        assert!(top_options(&records, &["On time"], 5).is_empty());
        assert_eq!(group_by_bus(&records).len(), 1);
        assert_eq!(crowdedness_distribution(&records)[0].count, 1);
    }

    #[test]
    fn test_rating_distribution_canonical_order() {
        let records = vec![
            rated(Rating::Excellent),
            rated(Rating::Fair),
            rated(Rating::Excellent),
            rated(Rating::Poor),
        ];
        let dist = rating_distribution(&records);
        let order: Vec<(Rating, usize)> = dist.iter().map(|d| (d.rating, d.count)).collect();
        assert_eq!(
            order,
            vec![
                (Rating::Poor, 1),
                (Rating::Fair, 1),
                (Rating::Excellent, 2)
            ]
        );
    }

    #[test]
    fn test_split_sums_to_rated_count() {
        let records: Vec<FeedbackRecord> = Rating::ALL
            .iter()
            .cycle()
            .take(13)
            .map(|r| rated(*r))
            .chain([on_bus(Some(1))])
            .collect();
        let split = positive_negative_split(&records);
        let rated_count = records.iter().filter(|r| r.rating.is_some()).count();
        assert_eq!(split.positive + split.negative, rated_count);

        let dist_total: usize = rating_distribution(&records).iter().map(|d| d.count).sum();
        assert_eq!(dist_total, rated_count);
    }

    #[test]
    fn test_top_options_ties_keep_first_encounter_order() {
        let vocab = ["Clean bus", "On time", "Friendly driver", "Safe driving"];
        let records = vec![
            tagged(&["Safe driving", "Clean bus"]),
            tagged(&["On time", "Clean bus"]),
            tagged(&["On time", "Friendly driver"]),
        ];

        let top = top_options(&records, &vocab, 10);
        let names: Vec<&str> = top.iter().map(|o| o.option.as_str()).collect();
        assert_eq!(
            names,
            vec!["Clean bus", "On time", "Safe driving", "Friendly driver"]
        );
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn test_top_options_restricted_to_vocabulary_and_truncated() {
        let records = vec![
            tagged(&["On time", "Overcrowded", "Late pickup"]),
            tagged(&["Overcrowded"]),
            tagged(&["Late pickup", "Overcrowded", "Missed stop"]),
        ];
        let issues = ["Late pickup", "Overcrowded", "Missed stop"];

        let top = top_options(&records, &issues, 2);
        assert_eq!(
            top,
            vec![
                OptionCount {
                    option: "Overcrowded".to_string(),
                    count: 3
                },
                OptionCount {
                    option: "Late pickup".to_string(),
                    count: 2
                },
            ]
        );

        let all = top_options(&records, &issues, 100);
        assert_eq!(all.len(), 3);
        assert!(top_options(&records, &issues, 0).is_empty());
    }

    #[test]
    fn test_top_options_counts_repeated_tag_once_per_record() {
        let records = vec![tagged(&["On time", "On time"]), tagged(&["On time"])];
        let top = top_options(&records, &["On time"], 3);
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn test_crowdedness_first_encounter_with_unknown() {
        let mut records = vec![on_bus(Some(1)), on_bus(Some(1)), on_bus(Some(2))];
        records[0].crowdedness = Some(Crowdedness::High);
        records[2].crowdedness = Some(Crowdedness::High);

        let dist = crowdedness_distribution(&records);
        assert_eq!(
            dist,
            vec![
                CrowdednessCount {
                    level: "High".to_string(),
                    count: 2
                },
                CrowdednessCount {
                    level: "Unknown".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_group_by_bus_scenario() {
        let records = vec![on_bus(Some(1)), on_bus(None), on_bus(Some(1))];
        let groups = group_by_bus(&records);

        let summary: Vec<(&str, usize)> =
            groups.iter().map(|g| (g.key.as_str(), g.len())).collect();
        assert_eq!(summary, vec![("Bus 1", 2), ("Other (Walkers)", 1)]);
        assert!(groups[1].is_walkers());
    }

    #[test]
    fn test_group_by_bus_ties_keep_first_encounter_order() {
        let records = vec![
            on_bus(Some(9)),
            on_bus(None),
            on_bus(Some(2)),
            on_bus(Some(2)),
            on_bus(Some(9)),
            on_bus(None),
        ];
        let keys: Vec<String> = group_by_bus(&records).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["Bus 9", "Other (Walkers)", "Bus 2"]);
    }

    #[test]
    fn test_group_average_rating() {
        let mut a = rated(Rating::Great);
        a.bus_number = Some(3);
        let mut b = rated(Rating::Fair);
        b.bus_number = Some(3);
        let records = [a, b];
        let groups = group_by_bus(&records);
        assert_eq!(groups[0].average_rating(), 3.0);
    }

    #[test]
    fn test_walker_split_ignores_metadata_flag() {
        let mut flagged_rider = on_bus(Some(4));
        flagged_rider.extra_metadata = ExtraMetadata { is_walker: true };
        let mut unflagged_walker = on_bus(None);
        unflagged_walker.extra_metadata = ExtraMetadata { is_walker: false };

        let records = vec![flagged_rider, unflagged_walker];
        let split = walker_rider_split(&records);

        assert_eq!(split.riders.len(), 1);
        assert_eq!(split.riders[0].bus_number, Some(4));
        assert_eq!(split.walkers.len(), 1);
    }

    #[test]
    fn test_average_wait_minutes() {
        let mut a = on_bus(Some(1));
        a.wait_time = Some(4.0);
        let mut b = on_bus(Some(1));
        b.wait_time = Some(8.0);
        let c = on_bus(Some(1));
        assert_eq!(average_wait_minutes(&[a, b, c]), 6.0);
        assert_eq!(average_wait_minutes(&[] as &[FeedbackRecord]), 0.0);
    }

    #[test]
    fn test_functions_are_idempotent() {
        let records = vec![
            tagged(&["On time", "Clean bus"]),
            rated(Rating::Good),
            on_bus(Some(2)),
        ];
        let before = records.clone();

        assert_eq!(
            top_options(&records, &["On time", "Clean bus"], 5),
            top_options(&records, &["On time", "Clean bus"], 5)
        );
        assert_eq!(group_by_bus(&records), group_by_bus(&records));
        assert_eq!(
            crowdedness_distribution(&records),
            crowdedness_distribution(&records)
        );
        assert_eq!(rating_distribution(&records), rating_distribution(&records));
        assert_eq!(records, before);
    }
}
