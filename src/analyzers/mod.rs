//! Feedback analytics.
//!
//! Reduces the raw `/feedback/all` stream into rating distributions, scalar
//! summaries, option rankings, crowdedness counts and per-bus groupings.
//! Only records flagged `is_published_feedback` contribute to any figure;
//! every function here applies that gate itself.

pub mod feedback;
pub mod summary;
pub mod types;
pub mod utility;

pub use feedback::{
    average_rating, average_wait_minutes, crowdedness_distribution, group_by_bus,
    positive_negative_split, published, rating_distribution, top_options, walker_rider_split,
};
pub use summary::FeedbackSummary;
pub use types::{
    BusGroup, CrowdednessCount, OptionCount, RatingCount, RatingSplit, WalkerRiderSplit,
    UNKNOWN_CROWDEDNESS, WALKER_GROUP,
};
