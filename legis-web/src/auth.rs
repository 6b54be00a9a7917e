//! HTTP Basic authentication against the `users` table
//!
//! Handlers that need a login take [`CurrentUser`] (any account) or
//! [`StaffUser`] (staff or superuser) as an argument. A missing or wrong
//! `Authorization` header answers 401 with a `WWW-Authenticate` challenge.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use legis_common::db::users::{verify_credentials, User};
use tracing::{debug, warn};

use crate::{AppState, WebError};

/// Logged-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Logged-in user with staff rights
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

/// Split a `Basic` authorization value into username and password
pub fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            debug!("No credentials for {}", parts.uri.path());
            return Err(WebError::Unauthorized);
        };

        let Some((username, password)) = parse_basic_credentials(value) else {
            return Err(WebError::Unauthorized);
        };

        match verify_credentials(&state.db, &username, &password).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!(username = %username, "Rejected login");
                Err(WebError::Unauthorized)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_staff || user.is_superuser {
            Ok(StaffUser(user))
        } else {
            Err(WebError::Forbidden)
        }
    }
}
