//! Loads the session named by the cookie into request extensions and writes the
//! cookie back for new or rotated sessions.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use super::{Session, SessionStore};
use crate::config::SessionConfig;
use crate::error::AppError;
use crate::{lwarn, logging::{LogComponent, LogStage}};

/// Value of cookie `name` from the request headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn set_cookie_value(config: &SessionConfig, id: &str) -> String {
    let mut cookie = format!(
        "{}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, config.ttl_seconds
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session middleware, mounted with `axum::middleware::from_fn_with_state`.
pub async fn session_layer(
    State(store): State<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_id = cookie_value(request.headers(), &store.config().cookie_name).map(str::to_string);
    let (session, created) = store.load_or_create(cookie_id.as_deref()).await;
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let outgoing_id = if session.wants_rotation() {
        Some(store.rotate(&session).await)
    } else if created {
        Some(session.id().to_string())
    } else {
        None
    };

    if let Some(id) = outgoing_id {
        match HeaderValue::from_str(&set_cookie_value(store.config(), &id)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(_) => lwarn!(
                "system",
                LogStage::Session,
                LogComponent::Session,
                "set_cookie",
                "session cookie could not be encoded"
            ),
        }
    }

    response
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::internal("session middleware is not installed"))
    }
}
