use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::warn;

use crate::config::Config;
use crate::error::ApiError;
use crate::fetch::{BasicClient, HttpClient, build_request, fetch_bytes, fetch_json};
use crate::model::{BusPosition, FeedbackRecord, RawRunDetail, Run, RunId, StudentTrip};
use crate::services::plan_api::{FeedbackPayload, PlanApi};

/// `/bus-location/{bus}` answers either a position or `{"error": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LocationResponse {
    Position(BusPosition),
    Error { error: String },
}

/// [`PlanApi`] over HTTP/JSON.
pub struct HttpPlanApi<C = BasicClient> {
    client: C,
    base_url: Url,
}

impl HttpPlanApi<BasicClient> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = BasicClient::with_timeouts(config.timeout, config.connect_timeout)?;
        Self::new(client, &config.api_url)
    }
}

impl<C: HttpClient> HttpPlanApi<C> {
    pub fn new(client: C, base_url: &str) -> anyhow::Result<Self> {
        // A trailing slash keeps Url::join from dropping the last path segment.
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&base)
            .map_err(|e| anyhow::anyhow!("Invalid API base URL {:?}: {}", base_url, e))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path:?}: {e}")))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = build_request::<()>(Method::GET, self.url(path)?, None)?;
        fetch_json(&self.client, req).await
    }

    async fn send_status_only(&self, method: Method, path: &str) -> Result<(), ApiError> {
        let req = build_request::<()>(method, self.url(path)?, None)?;
        fetch_bytes(&self.client, req).await.map(|_| ())
    }
}

#[async_trait]
impl<C: HttpClient> PlanApi for HttpPlanApi<C> {
    #[tracing::instrument(skip(self))]
    async fn list_runs(&self) -> Result<Vec<Run>, ApiError> {
        self.get("get_all_runs").await
    }

    #[tracing::instrument(skip(self), fields(run_id = %run_id))]
    async fn run_detail(&self, run_id: RunId) -> Result<RawRunDetail, ApiError> {
        self.get(&format!("get_run/{run_id}")).await
    }

    #[tracing::instrument(skip(self))]
    async fn published_run(&self) -> Result<RawRunDetail, ApiError> {
        self.get("get_published_run").await
    }

    #[tracing::instrument(skip(self), fields(run_id = %run_id))]
    async fn publish_run(&self, run_id: RunId) -> Result<(), ApiError> {
        self.send_status_only(Method::POST, &format!("publish_run/{run_id}"))
            .await
    }

    #[tracing::instrument(skip(self), fields(run_id = %run_id))]
    async fn delete_run(&self, run_id: RunId) -> Result<(), ApiError> {
        self.send_status_only(Method::DELETE, &format!("delete_run/{run_id}"))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn all_feedback(&self) -> Result<Vec<FeedbackRecord>, ApiError> {
        self.get("feedback/all").await
    }

    #[tracing::instrument(skip(self, payload), fields(run_id = ?payload.run_id, bus = ?payload.bus_number))]
    async fn submit_feedback(&self, payload: &FeedbackPayload) -> Result<(), ApiError> {
        let req = build_request(Method::POST, self.url("feedback")?, Some(payload))?;
        fetch_bytes(&self.client, req).await.map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn bus_location(&self, bus_number: u32) -> Result<Option<BusPosition>, ApiError> {
        match self.get(&format!("bus-location/{bus_number}")).await? {
            LocationResponse::Position(position) => Ok(Some(position)),
            LocationResponse::Error { error } => {
                warn!(bus_number, error = %error, "No bus location available");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn current_trip(&self, student_id: &str) -> Result<StudentTrip, ApiError> {
        self.get(&format!("current_trip/{student_id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_onto_base_path() {
        let api = HttpPlanApi::new(BasicClient::new(), "http://example.org/api").unwrap();
        assert_eq!(
            api.url("get_run/3").unwrap().as_str(),
            "http://example.org/api/get_run/3"
        );

        let api = HttpPlanApi::new(BasicClient::new(), "http://example.org/").unwrap();
        assert_eq!(
            api.url("feedback/all").unwrap().as_str(),
            "http://example.org/feedback/all"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(HttpPlanApi::new(BasicClient::new(), "not a url").is_err());
    }

    #[test]
    fn test_location_response_variants() {
        let pos: LocationResponse =
            serde_json::from_str(r#"{"bus_number": "21", "latitude": 40.5, "longitude": -74.6, "timestamp": "2025-01-01T00:00:00"}"#)
                .unwrap();
        assert!(matches!(pos, LocationResponse::Position(p) if p.latitude == 40.5));

        let err: LocationResponse =
            serde_json::from_str(r#"{"error": "No data for this bus yet"}"#).unwrap();
        assert!(matches!(err, LocationResponse::Error { .. }));
    }
}
