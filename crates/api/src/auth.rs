//! Caller identity extraction.
//!
//! Authentication happens in front of this service. The upstream layer
//! forwards the authenticated user through the `x-user-id` and
//! `x-user-role` headers.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{Caller, UserId, UserRole};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
///
/// A missing role header means `customer`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub Caller);

impl AuthenticatedCaller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&id| id > 0)
            .ok_or_else(|| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

        let role = match headers.get(USER_ROLE_HEADER) {
            None => UserRole::Customer,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.trim().to_ascii_lowercase().parse().ok())
                .ok_or_else(|| {
                    ApiError::Unauthorized(format!("invalid {USER_ROLE_HEADER} header"))
                })?,
        };

        Ok(Self(Caller {
            user_id: UserId::new(user_id),
            role,
        }))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
