//! Authentication boundary.
//!
//! Session handling lives in an upstream gateway; by the time a request
//! reaches this service the gateway has injected the authenticated identity
//! as trusted headers. The extractors here only read those headers, they
//! never verify credentials.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mediad_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

/// Authenticated principal for upload/manage routes.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub id: Uuid,
}

/// Principal with the admin role, required on privileged routes.
#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal {
    pub principal: Principal,
}

fn principal_from_parts(parts: &Parts) -> Result<Principal, AppError> {
    let raw = parts
        .headers
        .get(PRINCIPAL_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing principal header".to_string()))?;

    let id = Uuid::parse_str(raw)
        .map_err(|_| AppError::Unauthorized("Principal id is not a valid UUID".to_string()))?;

    Ok(Principal { id })
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts).map_err(HttpAppError)
    }
}

impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts).map_err(HttpAppError)?;

        let role = parts
            .headers
            .get(PRINCIPAL_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !role.eq_ignore_ascii_case("admin") {
            return Err(HttpAppError(AppError::Forbidden(
                "Admin role required".to_string(),
            )));
        }

        Ok(AdminPrincipal { principal })
    }
}
