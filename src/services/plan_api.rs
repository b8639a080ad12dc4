//! Trait and types for the route-planning backend.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;
use crate::model::{BusPosition, FeedbackRecord, RawRunDetail, Run, RunId, StudentTrip};

/// Body of `POST /feedback`, using the backend's field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackPayload {
    pub user_id: Option<String>,
    pub route_id: Option<i64>,
    pub run_id: Option<RunId>,
    pub bus_number: Option<u32>,
    pub rating: String,
    pub options: Vec<String>,
    pub comment: Option<String>,
    pub stop: Option<String>,
    pub boarding_time: Option<String>,
    pub wait_time: Option<f64>,
    pub crowdedness: Option<String>,
    pub metadata: PayloadMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadMetadata {
    pub is_walker: bool,
}

/// Abstraction over the backend endpoints this crate consumes.
///
/// Every method is a single request/response; none of them retries.
#[async_trait]
pub trait PlanApi: Send + Sync {
    /// `GET /get_all_runs`
    async fn list_runs(&self) -> Result<Vec<Run>, ApiError>;

    /// `GET /get_run/{id}`
    async fn run_detail(&self, run_id: RunId) -> Result<RawRunDetail, ApiError>;

    /// `GET /get_published_run`. [`ApiError::NotFound`] means no plan is
    /// published.
    async fn published_run(&self) -> Result<RawRunDetail, ApiError>;

    /// `POST /publish_run/{id}`
    async fn publish_run(&self, run_id: RunId) -> Result<(), ApiError>;

    /// `DELETE /delete_run/{id}`
    async fn delete_run(&self, run_id: RunId) -> Result<(), ApiError>;

    /// `GET /feedback/all`
    async fn all_feedback(&self) -> Result<Vec<FeedbackRecord>, ApiError>;

    /// `POST /feedback`
    async fn submit_feedback(&self, payload: &FeedbackPayload) -> Result<(), ApiError>;

    /// `GET /bus-location/{bus}`. `Ok(None)` when the backend has no fix for
    /// the bus yet.
    async fn bus_location(&self, bus_number: u32) -> Result<Option<BusPosition>, ApiError>;

    /// `GET /current_trip/{student_id}`
    async fn current_trip(&self, student_id: &str) -> Result<StudentTrip, ApiError>;
}
