//! Record model for the two families of backend records: optimization runs
//! (with their route/stop/student tree) and rider feedback.

mod feedback;
mod run;

pub use feedback::{
    Crowdedness, ExtraMetadata, FeedbackRecord, Rating, Vocabulary, ISSUE_OPTIONS,
    POSITIVE_OPTIONS,
};
pub use run::{
    BusPosition, OverviewMetric, RawRoute, RawRunDetail, RawStop, RouteDetail, Run, RunId, Stop,
    Student, StudentTrip, TripStop,
};
