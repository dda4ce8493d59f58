use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::profile::{Credentials, Registration, UserProfile};
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

/// A live session and the upstream token it holds.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session_id: Uuid,
    pub token: String,
}

pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Authenticated, AppError> {
    let session_id = session_id(headers).ok_or(AppError::Unauthorized)?;
    let token = state
        .sessions
        .token(session_id)
        .ok_or(AppError::Unauthorized)?;

    Ok(Authenticated { session_id, token })
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let credentials = Credentials {
        email: payload.email.trim().to_string(),
        password: payload.password,
    };
    let token = state
        .call("login", None, state.backend.login(&credentials))
        .await?;

    let session_id = state.sessions.sign_in(token);
    state
        .metrics
        .active_sessions
        .set(state.sessions.len() as i64);

    Ok(Json(SessionResponse { session_id }))
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() || request.email.trim().is_empty() {
        return Err(AppError::Validation(
            "name and email are required".to_string(),
        ));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if request.password != request.confirm_password {
        return Err(AppError::Validation("passwords do not match".to_string()));
    }
    Ok(())
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    validate_registration(&payload)?;

    let registration = Registration {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        password: payload.password,
    };
    let user = state
        .call("register", None, state.backend.register(&registration))
        .await?;

    info!(email = %user.email, "account registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let session_id = session_id(&headers).ok_or(AppError::Unauthorized)?;

    if state.end_session(session_id, false) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Unauthorized)
    }
}
