//! Admin credential handling - /api/auth
//!
//! POST /api/auth - check a password without changing anything
//!
//! Mutating endpoints read the credential per request from the
//! `X-Admin-Password` header via [`AdminCredential`].

use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crewdesk_core::state::AppState;

pub const ADMIN_HEADER: &str = "x-admin-password";

/// The admin credential presented with this request, if any.
#[derive(Debug, Clone, Default)]
pub struct AdminCredential(pub Option<String>);

impl AdminCredential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for AdminCredential
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ADMIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Self(value))
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(check_password))
}

#[derive(Debug, Deserialize)]
struct AuthRequest {
    #[serde(default)]
    password: Option<String>,
}

async fn check_password(
    State(state): State<AppState>,
    Json(body): Json<AuthRequest>,
) -> impl IntoResponse {
    match state.admin.authorize(body.password.as_deref()) {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "authorized": true }))),
        Err(e) => {
            tracing::info!("[Auth] Rejected admin login: {}", e);
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "authorized": false, "error": "Invalid password" })),
            )
        }
    }
}
