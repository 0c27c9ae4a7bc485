//! # Account handlers
//!
//! Thin adapters from HTTP onto the provider adapters, the resolver and the
//! registration service. Every successful flow ends in a 303 redirect.

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::{Redirect, Response};
use serde::{Deserialize, Serialize};

use super::RequestId;
use super::response::success;
use super::server::AppState;
use crate::error::{AppError, Result};
use crate::provider::CallbackParams;
use crate::resolution::Destination;
use crate::session::Session;
use crate::types::{PendingIdentity, ProviderKind};
use crate::{linfo, lwarn, logging::{LogComponent, LogStage}};

fn redirect_to(state: &AppState, destination: &Destination) -> Redirect {
    Redirect::to(&destination.url(&state.config.destinations))
}

/// Local redirect target from a `next` parameter, or `fallback` when the value
/// could leave the site.
#[must_use]
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.contains("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_whitespace) =>
        {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// `GET /ping`
pub async fn ping() -> &'static str {
    "pong"
}

/// `GET /accounts/{provider}/prepare`
pub async fn prepare(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    request_id: RequestId,
    session: Session,
) -> Result<Redirect> {
    let kind: ProviderKind = provider.parse()?;
    let client = state.providers.get(kind)?;

    let authorization = client
        .begin(state.config.providers.callback_url(kind))
        .await?;
    session.set_handshake(kind, authorization.handshake).await;

    linfo!(
        request_id,
        LogStage::Authentication,
        LogComponent::Provider,
        "prepare",
        "sending browser to provider",
        provider = kind.as_str()
    );
    Ok(redirect_to(&state, &Destination::Provider(authorization.redirect_url)))
}

/// `GET /accounts/{provider}/authenticate`
pub async fn authenticate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    request_id: RequestId,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let kind: ProviderKind = provider.parse()?;
    let client = state.providers.get(kind)?;

    let handshake = session.take_handshake(kind).await;
    let identity = client.complete(&params, handshake).await.map_err(|e| {
        lwarn!(
            request_id,
            LogStage::Authentication,
            LogComponent::Provider,
            "authenticate",
            &format!("provider callback rejected: {e}"),
            provider = kind.as_str()
        );
        AppError::from(e)
    })?;

    let outcome = state.resolver.resolve(identity, &session).await?;
    linfo!(
        request_id,
        LogStage::Resolution,
        LogComponent::Resolver,
        "authenticate",
        "identity resolved",
        provider = kind.as_str(),
        outcome = outcome.name()
    );
    Ok(redirect_to(&state, &outcome.destination()))
}

/// `POST /accounts/{provider}/deauthenticate`
pub async fn deauthenticate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    session: Session,
) -> Result<Redirect> {
    let kind: ProviderKind = provider.parse()?;
    state.resolver.unlink(&session, kind).await?;
    Ok(redirect_to(&state, &Destination::ProfileEdit))
}

#[derive(Debug, Serialize)]
pub struct SetupView {
    pub pending: PendingIdentity,
    pub registration_open: bool,
}

/// `GET /accounts/{provider}/setup`: the staged identity, left in place.
pub async fn setup_form(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    session: Session,
) -> Result<Response> {
    let kind: ProviderKind = provider.parse()?;
    let pending = session
        .peek_pending()
        .await
        .filter(|pending| pending.provider == kind)
        .ok_or_else(|| AppError::not_found(format!("no pending {kind} identity")))?;

    Ok(success(SetupView {
        pending,
        registration_open: state.registration.registration_open(kind),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// `POST /accounts/{provider}/setup`
pub async fn setup(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    request_id: RequestId,
    session: Session,
    Form(form): Form<SetupForm>,
) -> Result<Redirect> {
    let kind: ProviderKind = provider.parse()?;
    let pending = session.consume().await?;
    if pending.provider != kind {
        session.stage(pending).await;
        return Err(AppError::not_found(format!("no pending {kind} identity")));
    }

    match state
        .registration
        .complete_registration(pending.clone(), &form.username, &form.email)
        .await
    {
        Ok(user) => {
            session.login(user.id).await;
            linfo!(
                request_id,
                LogStage::Registration,
                LogComponent::Registration,
                "setup",
                "registration complete",
                provider = kind.as_str(),
                user_id = user.id
            );
            Ok(redirect_to(&state, &Destination::RegistrationComplete(kind)))
        }
        Err(err) => {
            // Keep the identity so the corrected form can be resubmitted.
            if matches!(err.root(), AppError::Validation { .. }) {
                session.stage(pending).await;
            }
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// `POST /accounts/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = state.directory.authenticate(&form.username, &form.password).await?;
    session.login(user.id).await;
    state.directory.record_login(&user).await?;

    Ok(Redirect::to(&safe_next(
        form.next.as_deref(),
        &state.config.destinations.home,
    )))
}

/// `POST /accounts/logout`
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    session.flush().await;
    redirect_to(&state, &Destination::Login)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("/accounts/profile/edit"), "/accounts/profile/edit")]
    #[case(Some("/search?q=a"), "/search?q=a")]
    #[case(Some("//evil.example.com"), "/")]
    #[case(Some("https://evil.example.com"), "/")]
    #[case(Some("/a b"), "/")]
    #[case(Some("/\\evil"), "/")]
    #[case(Some(""), "/")]
    #[case(None, "/")]
    fn test_safe_next(#[case] next: Option<&str>, #[case] expected: &str) {
        assert_eq!(safe_next(next, "/"), expected);
    }
}
