//! # Facebook adapter
//!
//! OAuth 2.0 authorization-code flow through the `oauth2` crate, then a Graph
//! API `/me` call for the identity.

use std::borrow::Cow;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;

use super::http::{describe_status, send_idempotent};
use super::{AuthorizationRequest, CallbackParams, PendingHandshake, ProviderClient, ProviderError};
use crate::config::FacebookConfig;
use crate::error::{AppError, Result};
use crate::types::{ProfileFields, ProviderKind, VerifiedIdentity};
use crate::{ldebug, lwarn, logging::{LogComponent, LogStage}};

const KIND: ProviderKind = ProviderKind::Facebook;

type FacebookOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Public profile URL for a Facebook user id.
#[must_use]
pub fn profile_url(uid: &str) -> String {
    format!("http://facebook.com/profile.php?id={uid}")
}

#[derive(Debug, Deserialize)]
struct GraphUser {
    id: String,
    name: Option<String>,
    picture: Option<GraphPicture>,
}

#[derive(Debug, Deserialize)]
struct GraphPicture {
    data: Option<GraphPictureData>,
}

#[derive(Debug, Deserialize)]
struct GraphPictureData {
    url: Option<String>,
}

pub struct FacebookProvider {
    oauth: FacebookOAuthClient,
    http: Client,
    scopes: Vec<String>,
    graph_url: String,
}

impl FacebookProvider {
    pub fn new(config: &FacebookConfig, http: Client) -> Result<Self> {
        let oauth = BasicClient::new(ClientId::new(config.app_id.clone()))
            .set_client_secret(ClientSecret::new(config.app_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.authorize_url.clone()).map_err(|e| {
                AppError::config_with_source("invalid providers.facebook.authorize_url", e)
            })?)
            .set_token_uri(TokenUrl::new(config.token_url.clone()).map_err(|e| {
                AppError::config_with_source("invalid providers.facebook.token_url", e)
            })?)
            .set_auth_type(AuthType::RequestBody);

        Ok(Self {
            oauth,
            http,
            scopes: config.scopes.clone(),
            graph_url: config.graph_url.trim_end_matches('/').to_string(),
        })
    }

    async fn exchange_code(&self, code: &str, redirect_url: &str) -> std::result::Result<String, ProviderError> {
        let redirect = RedirectUrl::new(redirect_url.to_string())
            .map_err(|e| ProviderError::auth_failure(KIND, format!("bad redirect url: {e}")))?;

        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_redirect_uri(Cow::Owned(redirect))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::auth_failure(KIND, format!("code exchange failed: {e}")))?;

        Ok(token.access_token().secret().clone())
    }

    async fn fetch_me(&self, access_token: &str) -> std::result::Result<GraphUser, ProviderError> {
        let url = format!("{}/me", self.graph_url);
        let response = send_idempotent(KIND, "graph_me", || {
            self.http
                .get(&url)
                .query(&[("fields", "id,name,picture"), ("access_token", access_token)])
        })
        .await
        .map_err(|e| ProviderError::auth_failure(KIND, format!("graph request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::auth_failure(
                KIND,
                describe_status("graph /me", response).await,
            ));
        }

        response
            .json::<GraphUser>()
            .await
            .map_err(|e| ProviderError::auth_failure(KIND, format!("unreadable graph response: {e}")))
    }
}

#[async_trait]
impl ProviderClient for FacebookProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    async fn begin(&self, return_url: &str) -> std::result::Result<AuthorizationRequest, ProviderError> {
        let redirect = RedirectUrl::new(return_url.to_string())
            .map_err(|e| ProviderError::unavailable(KIND, format!("bad return url: {e}")))?;

        let (url, state) = self
            .oauth
            .authorize_url(CsrfToken::new_random)
            .set_redirect_uri(Cow::Owned(redirect))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .url();

        Ok(AuthorizationRequest {
            redirect_url: url.to_string(),
            handshake: PendingHandshake::OAuth2 {
                state: state.secret().clone(),
                redirect_url: return_url.to_string(),
            },
        })
    }

    async fn complete(
        &self,
        params: &CallbackParams,
        handshake: Option<PendingHandshake>,
    ) -> std::result::Result<VerifiedIdentity, ProviderError> {
        if let Some(error) = &params.error {
            let reason = params.error_description.as_deref().unwrap_or(error);
            return Err(ProviderError::auth_failure(KIND, format!("authorization refused: {reason}")));
        }

        let Some(PendingHandshake::OAuth2 { state, redirect_url }) = handshake else {
            return Err(ProviderError::auth_failure(KIND, "no facebook handshake in progress"));
        };
        if params.state.as_deref() != Some(state.as_str()) {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Facebook,
                "complete",
                "state mismatch on callback"
            );
            return Err(ProviderError::auth_failure(KIND, "state mismatch"));
        }
        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::auth_failure(KIND, "callback carried no code"))?;

        let access_token = self.exchange_code(code, &redirect_url).await?;
        let me = self.fetch_me(&access_token).await?;

        ldebug!(
            "system",
            LogStage::ExternalApi,
            LogComponent::Facebook,
            "complete",
            "identity verified",
            external_id = %me.id
        );

        let avatar = me.picture.and_then(|p| p.data).and_then(|d| d.url);
        Ok(VerifiedIdentity {
            provider: KIND,
            profile: ProfileFields {
                name: me.name,
                avatar,
                profile_url: Some(profile_url(&me.id)),
            },
            external_id: me.id,
            access_token: Some(access_token),
        })
    }
}
