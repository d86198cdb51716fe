//! Request authentication.
//!
//! A request authenticates with `Authorization: Bearer <token>` or a
//! `session=<token>` cookie. Anything else is rejected with 401 before any
//! bucket lookup happens.

use crate::{errors::AppError, models::user::User, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

pub const SESSION_COOKIE: &str = "session";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) =
            bearer_token(&parts.headers).or_else(|| session_cookie(&parts.headers))
        else {
            return Err(AppError::unauthenticated());
        };

        match state.users.user_for_token(token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                tracing::debug!("rejected unknown or inactive token");
                Err(AppError::unauthenticated())
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}
