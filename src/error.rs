//! Error taxonomy shared by the backend client, the plan registry and
//! feedback submission.

use thiserror::Error;

use crate::model::RunId;

/// Failures talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered 404. For `/get_published_run` this means no plan
    /// is currently published; callers decide whether that is an error.
    #[error("resource not found")]
    NotFound,

    /// The endpoint answered with any other non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request URL {0}")]
    InvalidUrl(String),

    /// The response body could not be decoded into the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

/// Failures of [`crate::registry::PlanRegistry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// More than one run came back flagged as published. The registry mirrors
    /// the backend and refuses to pick one.
    #[error("backend reports multiple published runs: {0:?}")]
    AmbiguousPublished(Vec<RunId>),
}

/// User input rejected before anything is sent to the backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a rating is required before submitting feedback")]
    MissingRating,

    #[error("option {0:?} is not part of the feedback vocabulary")]
    UnknownOption(String),

    #[error("crowdedness only applies to bus riders")]
    CrowdednessForWalker,
}

/// Failures of feedback submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
