// Bearer token extraction
//
// Tokens are issued by the job board's OAuth flow elsewhere; this service
// only forwards them.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::hh::Credentials;
use crate::types::{AppError, AppResult};

/// Credentials from an `Authorization: Bearer <token>` header, if present
pub fn bearer_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(Credentials::new(token))
}

pub fn require_credentials(headers: &HeaderMap) -> AppResult<Credentials> {
    bearer_credentials(headers)
        .ok_or_else(|| AppError::Auth("missing or malformed bearer token".to_string()))
}
