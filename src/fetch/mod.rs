mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::{Method, Request, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// Builds a request, optionally with a JSON body.
pub fn build_request<B: Serialize>(
    method: Method,
    url: Url,
    body: Option<&B>,
) -> Result<Request, ApiError> {
    let mut req = Request::new(method, url);
    if let Some(body) = body {
        let bytes = serde_json::to_vec(body)?;
        req.headers_mut().insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        *req.body_mut() = Some(bytes.into());
    }
    Ok(req)
}

/// Sends `req` and returns the body of a successful response.
///
/// 404 maps to [`ApiError::NotFound`]; any other non-success status to
/// [`ApiError::Status`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, req: Request) -> Result<Vec<u8>, ApiError> {
    let method = req.method().clone();
    let url = req.url().to_string();

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%method, %url, status = status.as_u16(), "Backend responded");

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp.bytes().await?.to_vec())
}

/// Sends `req` and decodes a successful JSON response.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    req: Request,
) -> Result<T, ApiError> {
    let bytes = fetch_bytes(client, req).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_sets_json_body() {
        let url: Url = "http://localhost:8000/feedback".parse().unwrap();
        let req = build_request(Method::POST, url, Some(&serde_json::json!({"rating": "Good"})))
            .unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(
            req.headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"rating":"Good"}"#);
    }

    #[test]
    fn test_build_request_without_body() {
        let url: Url = "http://localhost:8000/get_all_runs".parse().unwrap();
        let req = build_request::<()>(Method::GET, url, None).unwrap();

        assert!(req.body().is_none());
        assert!(req.headers().get(reqwest::header::CONTENT_TYPE).is_none());
    }
}
