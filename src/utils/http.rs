// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use crate::auth::Credentials;
use crate::error::{AppError, Result};
use crate::models::ApiConfig;

const ACCEPT_VERSION: HeaderName = HeaderName::from_static("accept-version");

/// Create a configured asynchronous HTTP client.
///
/// Every request carries the API version and, when given, the
/// authorization header.
pub fn create_client(
    config: &ApiConfig,
    credentials: Option<&Credentials>,
) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_VERSION, header_value(&config.api_version)?);
    if let Some(credentials) = credentials {
        let mut value = header_value(&credentials.header_value())?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Client for fetching image binaries.
///
/// Download links live on other hosts than the API, so no credentials
/// are attached.
pub fn create_download_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Turn a non-success response into an [`AppError::Api`].
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::api(status.as_u16(), url, api_message(&body, status)))
}

/// Best-effort extraction of the API's `{"errors": [...]}` payload.
pub fn api_message(body: &str, status: reqwest::StatusCode) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        errors: Vec<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("invalid header value {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_api_message_prefers_error_list() {
        let body = r#"{"errors":["OAuth error: The access token is invalid"]}"#;
        assert_eq!(
            api_message(body, StatusCode::UNAUTHORIZED),
            "OAuth error: The access token is invalid"
        );
    }

    #[test]
    fn test_api_message_falls_back_to_reason() {
        assert_eq!(api_message("<html>", StatusCode::NOT_FOUND), "Not Found");
    }

    #[test]
    fn test_create_client_rejects_bad_header() {
        let config = ApiConfig {
            api_version: "v1\n".to_string(),
            ..ApiConfig::default()
        };
        assert!(create_client(&config, None).is_err());
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        use wiremock::matchers::{header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("accept-version", "v1"))
            .and(header("authorization", "Client-ID key123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials::ClientId("key123".to_string());
        let client = create_client(&ApiConfig::default(), Some(&credentials)).unwrap();
        let response = client.get(server.uri()).send().await.unwrap();
        assert!(ensure_success(response).await.is_ok());
    }
}
