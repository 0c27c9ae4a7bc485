//! # Twitter adapter
//!
//! Three-legged OAuth 1.0a: request token, user authorization, access token.
//! Requests are signed with HMAC-SHA1 by `oauth1_request`. The identity comes
//! from `account/verify_credentials`, which is authoritative over the `user_id`
//! echoed in the access token response.

use async_trait::async_trait;
use oauth1_request as oauth;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use url::Url;

use super::http::{describe_status, send_idempotent, send_once};
use super::{AuthorizationRequest, CallbackParams, PendingHandshake, ProviderClient, ProviderError};
use crate::config::TwitterConfig;
use crate::error::{AppError, Result};
use crate::types::{ProfileFields, ProviderKind, VerifiedIdentity};
use crate::{ldebug, lwarn, logging::{LogComponent, LogStage}};

const KIND: ProviderKind = ProviderKind::Twitter;

/// Public profile URL for a screen name.
#[must_use]
pub fn profile_url(screen_name: &str) -> String {
    format!("https://twitter.com/{screen_name}")
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id_str: String,
    screen_name: Option<String>,
    name: Option<String>,
    profile_image_url_https: Option<String>,
}

/// Form-encoded body of a request token or access token reply.
struct TokenReply(Vec<(String, String)>);

impl TokenReply {
    fn parse(body: &str) -> Self {
        Self(url::form_urlencoded::parse(body.as_bytes()).into_owned().collect())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    fn token_pair(&self) -> Option<(String, String)> {
        Some((
            self.get("oauth_token")?.to_string(),
            self.get("oauth_token_secret")?.to_string(),
        ))
    }
}

/// Access token pair returned by the access token endpoint.
struct AccessToken {
    token: String,
    secret: String,
    user_id: Option<String>,
}

impl AccessToken {
    /// Serialized form stored on the association.
    fn serialize(&self) -> String {
        format!(
            "oauth_token={}&oauth_token_secret={}",
            urlencoding::encode(&self.token),
            urlencoding::encode(&self.secret)
        )
    }
}

pub struct TwitterProvider {
    http: Client,
    consumer_key: String,
    consumer_secret: String,
    request_token_url: Url,
    authorize_url: Url,
    access_token_url: Url,
    verify_credentials_url: Url,
}

fn parse_url(value: &str, field: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| AppError::config_with_source(format!("invalid providers.twitter.{field}"), e))
}

impl TwitterProvider {
    pub fn new(config: &TwitterConfig, http: Client) -> Result<Self> {
        let api_base = config.api_base_url.trim_end_matches('/');
        Ok(Self {
            http,
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            request_token_url: parse_url(&config.request_token_url, "request_token_url")?,
            authorize_url: parse_url(&config.authorize_url, "authorize_url")?,
            access_token_url: parse_url(&config.access_token_url, "access_token_url")?,
            verify_credentials_url: parse_url(
                &format!("{api_base}/1.1/account/verify_credentials.json"),
                "api_base_url",
            )?,
        })
    }

    fn client_credentials(&self) -> oauth::Credentials<&str> {
        oauth::Credentials::new(self.consumer_key.as_str(), self.consumer_secret.as_str())
    }

    async fn fetch_request_token(&self, return_url: &str) -> std::result::Result<(String, String), ProviderError> {
        let header = oauth::Builder::<_, _>::new(self.client_credentials(), oauth::HMAC_SHA1)
            .callback(return_url)
            .post(&self.request_token_url, &());

        let response = send_once(
            self.http
                .post(self.request_token_url.clone())
                .header(AUTHORIZATION, header),
        )
        .await
        .map_err(|e| ProviderError::unavailable(KIND, format!("request token call failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::unavailable(
                KIND,
                describe_status("request_token", response).await,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::unavailable(KIND, format!("unreadable request token: {e}")))?;
        let reply = TokenReply::parse(&body);

        // Without confirmation the provider would not send the browser back to us.
        if reply.get("oauth_callback_confirmed") != Some("true") {
            return Err(ProviderError::unavailable(KIND, "callback not confirmed"));
        }
        reply
            .token_pair()
            .ok_or_else(|| ProviderError::unavailable(KIND, "request token response incomplete"))
    }

    async fn exchange_verifier(
        &self,
        request_token: &str,
        request_token_secret: &str,
        verifier: &str,
    ) -> std::result::Result<AccessToken, ProviderError> {
        let header = oauth::Builder::<_, _>::new(self.client_credentials(), oauth::HMAC_SHA1)
            .token(oauth::Credentials::new(request_token, request_token_secret))
            .verifier(verifier)
            .post(&self.access_token_url, &());

        let response = send_once(
            self.http
                .post(self.access_token_url.clone())
                .header(AUTHORIZATION, header),
        )
        .await
        .map_err(|e| ProviderError::auth_failure(KIND, format!("access token call failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::auth_failure(
                KIND,
                describe_status("access_token", response).await,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::auth_failure(KIND, format!("unreadable access token: {e}")))?;
        let reply = TokenReply::parse(&body);
        let (token, secret) = reply
            .token_pair()
            .ok_or_else(|| ProviderError::auth_failure(KIND, "access token response incomplete"))?;
        Ok(AccessToken {
            token,
            secret,
            user_id: reply.get("user_id").map(str::to_string),
        })
    }

    async fn verify_credentials(&self, access: &AccessToken) -> std::result::Result<TwitterUser, ProviderError> {
        let url = &self.verify_credentials_url;
        let response = send_idempotent(KIND, "verify_credentials", || {
            // Signed per attempt so a retry carries a fresh nonce.
            let header = oauth::Builder::<_, _>::new(self.client_credentials(), oauth::HMAC_SHA1)
                .token(oauth::Credentials::new(access.token.as_str(), access.secret.as_str()))
                .get(url, &());
            self.http.get(url.clone()).header(AUTHORIZATION, header)
        })
        .await
        .map_err(|e| ProviderError::auth_failure(KIND, format!("verify_credentials failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::auth_failure(
                KIND,
                describe_status("verify_credentials", response).await,
            ));
        }

        response
            .json::<TwitterUser>()
            .await
            .map_err(|e| ProviderError::auth_failure(KIND, format!("unreadable user: {e}")))
    }
}

#[async_trait]
impl ProviderClient for TwitterProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    async fn begin(&self, return_url: &str) -> std::result::Result<AuthorizationRequest, ProviderError> {
        let (request_token, request_token_secret) = self.fetch_request_token(return_url).await?;

        let mut redirect = self.authorize_url.clone();
        redirect
            .query_pairs_mut()
            .append_pair("oauth_token", &request_token);

        ldebug!(
            "system",
            LogStage::ExternalApi,
            LogComponent::Twitter,
            "begin",
            "request token obtained"
        );

        Ok(AuthorizationRequest {
            redirect_url: redirect.to_string(),
            handshake: PendingHandshake::OAuth1 {
                request_token,
                request_token_secret,
            },
        })
    }

    async fn complete(
        &self,
        params: &CallbackParams,
        handshake: Option<PendingHandshake>,
    ) -> std::result::Result<VerifiedIdentity, ProviderError> {
        if params.denied.is_some() {
            return Err(ProviderError::auth_failure(KIND, "authorization refused by user"));
        }

        let Some(PendingHandshake::OAuth1 {
            request_token,
            request_token_secret,
        }) = handshake
        else {
            return Err(ProviderError::auth_failure(KIND, "no twitter handshake in progress"));
        };

        if params.oauth_token.as_deref() != Some(request_token.as_str()) {
            return Err(ProviderError::auth_failure(KIND, "request token mismatch"));
        }
        let verifier = params
            .oauth_verifier
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::auth_failure(KIND, "callback carried no verifier"))?;

        let access = self
            .exchange_verifier(&request_token, &request_token_secret, verifier)
            .await?;
        let user = self.verify_credentials(&access).await?;

        if let Some(user_id) = access.user_id.as_deref() {
            if user_id != user.id_str {
                lwarn!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Twitter,
                    "complete",
                    "access token user_id disagrees with verified identity"
                );
                return Err(ProviderError::auth_failure(KIND, "identity mismatch"));
            }
        }

        Ok(VerifiedIdentity {
            provider: KIND,
            access_token: Some(access.serialize()),
            profile: ProfileFields {
                name: user.name,
                avatar: user.profile_image_url_https,
                profile_url: user.screen_name.as_deref().map(profile_url),
            },
            external_id: user.id_str,
        })
    }
}
