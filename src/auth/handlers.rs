use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    cookie::{clear_refresh_cookie, get_cookie, refresh_cookie, REFRESH_COOKIE_NAME},
    dto::{AuthRequest, UserData},
    extractors::AuthUser,
    services::{is_valid_email, normalize_email, AuthService},
};
use crate::{error::AppError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/refresh", get(refresh))
}

fn validated(payload: AuthRequest) -> Result<AuthRequest, AppError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if payload.password.is_empty() {
        warn!("empty password");
        return Err(AppError::BadRequest("Password is required".into()));
    }
    Ok(AuthRequest {
        email,
        password: payload.password,
    })
}

fn with_refresh_cookie(
    state: &AppState,
    auth: &AuthService,
    token: &str,
) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        refresh_cookie(token, auth.keys().refresh_ttl, state.config.auth.cookie_secure)?,
    );
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Result<(HeaderMap, Json<UserData>), AppError> {
    let payload = validated(payload)?;

    // Ensure email is not taken
    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let auth = AuthService::from_ref(&state);
    let data = auth.register(&payload.email, &payload.password).await?;
    let headers = with_refresh_cookie(&state, &auth, &data.refresh_token)?;
    Ok((headers, Json(data)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Result<(HeaderMap, Json<UserData>), AppError> {
    let payload = validated(payload)?;

    let auth = AuthService::from_ref(&state);
    let user = auth
        .validate_user(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Incorrect email or password".into()))?;

    let data = auth.generate_user_data(&user).await?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    let headers = with_refresh_cookie(&state, &auth, &data.refresh_token)?;
    Ok((headers, Json(data)))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
) -> Result<(HeaderMap, String), AppError> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or_else(AppError::unauthorized)?;

    let auth = AuthService::from_ref(&state);
    let token = auth.logout(&token).await?;
    info!(user_id = claims.id, "refresh cookie cleared");

    let mut out = HeaderMap::new();
    out.insert(header::SET_COOKIE, clear_refresh_cookie());
    Ok((out, token))
}

#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<UserData>), AppError> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or_else(AppError::unauthorized)?;

    let auth = AuthService::from_ref(&state);
    let data = auth.refresh(&token).await?.ok_or_else(AppError::unauthorized)?;

    let headers = with_refresh_cookie(&state, &auth, &data.refresh_token)?;
    Ok((headers, Json(data)))
}
