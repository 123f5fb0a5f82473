//! Caller extraction from bearer tokens and request headers

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::review::AuditContext;
use crate::domain::user::Caller;

pub const SESSION_HEADER: &str = "x-session-id";
pub const LOCATION_HEADER: &str = "x-client-location";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Extractor that requires a valid JWT and yields the acting caller
///
/// The token is read from `Authorization: Bearer <jwt>`; audit context comes
/// from `X-Forwarded-For`, `User-Agent`, `X-Session-Id` and `X-Client-Location`.
#[derive(Debug, Clone)]
pub struct RequireCaller(pub Caller);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_token(&parts.headers)?;

        let claims = state
            .token_validator
            .validate(&token)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        debug!(user_id = %claims.sub, role = %claims.role, "Authenticated caller");

        let caller = Caller::new(claims.sub, claims.role).with_audit(audit_context(&parts.headers));
        Ok(RequireCaller(caller))
    }
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide JWT token via 'Authorization: Bearer <token>' header",
    ))
}

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Audit context for the ledger; the client IP is the first `X-Forwarded-For` hop
pub fn audit_context(headers: &HeaderMap) -> AuditContext {
    let mut audit = AuditContext::system();

    if let Some(ip) = header_value(headers, FORWARDED_FOR_HEADER)
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
    {
        audit = audit.with_ip(ip);
    }

    if let Some(agent) = header_value(headers, header::USER_AGENT) {
        audit = audit.with_user_agent(agent);
    }

    if let Some(session) = header_value(headers, SESSION_HEADER) {
        audit = audit.with_session(session);
    }

    if let Some(location) = header_value(headers, LOCATION_HEADER) {
        audit = audit.with_location(location);
    }

    audit
}
