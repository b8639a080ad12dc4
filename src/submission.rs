//! Rider feedback submission.

use tracing::info;

use crate::error::{SubmitError, ValidationError};
use crate::model::{Crowdedness, Rating, RunId, StudentTrip, Vocabulary};
use crate::services::plan_api::{FeedbackPayload, PayloadMetadata, PlanApi};

/// Feedback as entered by a student, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackDraft {
    pub student_id: Option<String>,
    pub route_id: Option<i64>,
    pub run_id: Option<RunId>,
    pub bus_number: Option<u32>,
    pub rating: Option<Rating>,
    pub positives: Vec<String>,
    pub issues: Vec<String>,
    pub comment: Option<String>,
    pub stop: Option<String>,
    pub boarding_time: Option<String>,
    pub wait_time: Option<f64>,
    pub crowdedness: Option<Crowdedness>,
}

impl FeedbackDraft {
    /// A draft pre-filled from the student's current trip.
    pub fn for_trip(trip: &StudentTrip) -> Self {
        Self {
            student_id: Some(trip.student_id.clone()),
            route_id: trip.route_id,
            run_id: trip.run_id,
            bus_number: if trip.is_walker { None } else { trip.bus_number },
            stop: trip.stop.as_ref().and_then(|s| s.address.clone()),
            ..Default::default()
        }
    }

    pub fn is_walker(&self) -> bool {
        self.bus_number.is_none()
    }

    pub fn validate(&self, vocabulary: &Vocabulary) -> Result<(), ValidationError> {
        if self.rating.is_none() {
            return Err(ValidationError::MissingRating);
        }
        if let Some(bad) = self.positives.iter().find(|p| !vocabulary.is_positive(p)) {
            return Err(ValidationError::UnknownOption(bad.clone()));
        }
        if let Some(bad) = self.issues.iter().find(|i| !vocabulary.is_issue(i)) {
            return Err(ValidationError::UnknownOption(bad.clone()));
        }
        if self.is_walker() && self.crowdedness.is_some() {
            return Err(ValidationError::CrowdednessForWalker);
        }
        Ok(())
    }

    /// Validates and builds the request body.
    pub fn to_payload(&self, vocabulary: &Vocabulary) -> Result<FeedbackPayload, ValidationError> {
        self.validate(vocabulary)?;
        let rating = self.rating.ok_or(ValidationError::MissingRating)?;

        Ok(FeedbackPayload {
            user_id: self.student_id.clone(),
            route_id: self.route_id,
            run_id: self.run_id,
            bus_number: self.bus_number,
            rating: rating.as_str().to_string(),
            options: self
                .positives
                .iter()
                .chain(&self.issues)
                .cloned()
                .collect(),
            comment: self.comment.clone().filter(|c| !c.trim().is_empty()),
            stop: self.stop.clone(),
            boarding_time: self.boarding_time.clone(),
            wait_time: self.wait_time,
            crowdedness: self.crowdedness.map(|c| c.as_str().to_string()),
            metadata: PayloadMetadata {
                is_walker: self.is_walker(),
            },
        })
    }
}

/// Validates `draft` and posts it. Nothing is sent if validation fails.
#[tracing::instrument(skip_all, fields(run_id = ?draft.run_id, bus = ?draft.bus_number))]
pub async fn submit<A: PlanApi + ?Sized>(
    draft: &FeedbackDraft,
    vocabulary: &Vocabulary,
    api: &A,
) -> Result<(), SubmitError> {
    let payload = draft.to_payload(vocabulary)?;
    api.submit_feedback(&payload).await?;
    info!("Feedback submitted");
    Ok(())
}
