//! # Outbound HTTP
//!
//! Shared reqwest client and the single-retry policy for idempotent identity
//! fetches. Credential exchanges go through [`send_once`] and are never retried.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, redirect::Policy};

use crate::config::HttpConfig;
use crate::error::{AppError, Result};
use crate::types::ProviderKind;
use crate::{lwarn, logging::{LogComponent, LogStage}};

/// Attempts for an idempotent identity fetch: the first try plus one retry.
pub const IDENTITY_FETCH_ATTEMPTS: u32 = 2;

/// Build the client every adapter shares. Redirects are not followed so token
/// endpoints cannot bounce credentials elsewhere.
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .build()
        .map_err(|e| AppError::internal_with_source("failed to build HTTP client", e))
}

/// Send a request exactly once.
pub async fn send_once(request: RequestBuilder) -> std::result::Result<Response, reqwest::Error> {
    request.send().await
}

/// Send an idempotent request, retrying once on transport errors and 5xx.
///
/// `build` is called per attempt so signed requests get a fresh nonce.
pub async fn send_idempotent<F>(
    provider: ProviderKind,
    operation: &str,
    mut build: F,
) -> std::result::Result<Response, reqwest::Error>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt = 1;
    loop {
        let result = build().send().await;
        let retryable = match &result {
            Ok(response) => response.status().is_server_error(),
            Err(err) => err.is_timeout() || err.is_connect() || err.is_request(),
        };

        if !retryable || attempt >= IDENTITY_FETCH_ATTEMPTS {
            return result;
        }

        lwarn!(
            "system",
            LogStage::ExternalApi,
            LogComponent::Provider,
            operation,
            "retrying identity fetch",
            provider = provider.as_str(),
            attempt = attempt
        );
        attempt += 1;
    }
}

/// Describe a non-2xx response, with a clipped body for the log.
pub async fn describe_status(what: &str, response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let clipped: String = body.chars().take(200).collect();
    format!("{what} returned {status}: {clipped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_idempotent_request_retries_once_on_5xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&HttpConfig::default()).unwrap();
        let url = format!("{}/me", server.uri());
        let response = send_idempotent(ProviderKind::Facebook, "fetch", || client.get(&url))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_idempotent_request_gives_up_after_second_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = build_http_client(&HttpConfig::default()).unwrap();
        let url = format!("{}/me", server.uri());
        let response = send_idempotent(ProviderKind::Twitter, "fetch", || client.get(&url))
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_send_once_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&HttpConfig::default()).unwrap();
        let response = send_once(client.post(format!("{}/token", server.uri())))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
    }
}
