//! Handlers for the `/auth` resource (login, refresh, logout).

use axum::extract::State;
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use biblio_core::audit::{actions, entities};
use biblio_core::error::CoreError;
use biblio_core::types::DbId;
use biblio_db::models::audit::CreateAuditLog;
use biblio_db::models::session::CreateSession;
use biblio_db::models::user::User;
use biblio_db::repositories::{SessionRepo, UserRepo};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::auth::{AuthUser, ACCESS_TOKEN_COOKIE};
use crate::state::AppState;

/// Consecutive failed logins before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Lock duration once [`MAX_FAILED_ATTEMPTS`] is reached.
const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username and password. Returns access and refresh
/// tokens and sets the `access_token` cookie for browser clients.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Response> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    };

    let user = UserRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        return Err(invalid());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let response = create_auth_response(&state, &user, &headers).await?;
    record_audit(
        &state,
        CreateAuditLog::new(Some(user.id), actions::LOGIN, entities::USER, user.id),
    )
    .await;
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(with_access_cookie(
        Json(response.body).into_response(),
        &response.access_token,
        state.config.jwt.access_token_ttl_secs(),
    ))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new token pair. The presented token's
/// session is revoked, so each refresh token works once.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Response> {
    let token_hash = hash_refresh_token(input.refresh_token.trim());

    let session = SessionRepo::find_active_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // A concurrent refresh may have revoked it between the lookup and here.
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        )));
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let response = create_auth_response(&state, &user, &headers).await?;

    Ok(with_access_cookie(
        Json(response.body).into_response(),
        &response.access_token,
        state.config.jwt.access_token_ttl_secs(),
    ))
}

/// POST /api/v1/auth/logout
///
/// Revoke every session of the caller and clear the cookie. Returns 204.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Response> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(auth_user.user_id),
            actions::LOGOUT,
            entities::USER,
            auth_user.user_id,
        )
        .with_new(json!({ "revoked_sessions": revoked })),
    )
    .await;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");

    Ok(with_access_cookie(StatusCode::NO_CONTENT.into_response(), "", 0))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct IssuedTokens {
    access_token: String,
    body: AuthResponse,
}

/// Sign an access token, persist a refresh session, and build the response.
async fn create_auth_response(
    state: &AppState,
    user: &User,
    headers: &HeaderMap,
) -> AppResult<IssuedTokens> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(255).collect());

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at: jwt.refresh_expires_at(),
            user_agent,
            ip_address: None,
        },
    )
    .await?;

    Ok(IssuedTokens {
        access_token: access_token.clone(),
        body: AuthResponse {
            access_token,
            refresh_token: refresh_plaintext,
            expires_in: jwt.access_token_ttl_secs(),
            user: UserInfo {
                id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                role: user.role.clone(),
            },
        },
    })
}

/// Attach a `Set-Cookie` for the access token. An empty token with
/// `max_age = 0` clears it.
fn with_access_cookie(mut response: Response, token: &str, max_age: i64) -> Response {
    let cookie = format!(
        "{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Could not encode access token cookie"),
    }
    response
}
