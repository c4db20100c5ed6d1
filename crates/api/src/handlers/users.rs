//! Handlers for the `/users` resource.
//!
//! Registration is public and always creates a reader unless the caller is an
//! admin. Profiles are readable by their owner and by librarians; only admins
//! change roles, activation, or other users' accounts.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use biblio_core::audit::{actions, entities};
use biblio_core::catalog::validate_name;
use biblio_core::error::CoreError;
use biblio_core::roles::{validate_role, ROLE_READER};
use biblio_core::types::DbId;
use biblio_db::models::audit::CreateAuditLog;
use biblio_db::models::dashboard::ReaderSummary;
use biblio_db::models::user::{CreateUser, UpdateUser, UserResponse};
use biblio_db::repositories::{DashboardRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::handlers::{record_audit, today};
use crate::middleware::auth::{authenticate, AuthUser};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_PERSON_NAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
    /// Honoured only when the caller is an admin.
    pub role: Option<String>,
}

/// Query parameters for `GET /users`.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `PUT /users/{id}/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Required unless an admin resets another user's password.
    pub current_password: Option<String>,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// `GET /users/profile` payload: the account plus its circulation counters.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub summary: ReaderSummary,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/users
///
/// Register an account. Anonymous callers always get the `reader` role; an
/// admin may pass `role` to create staff accounts.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let caller = authenticate(&headers, &state.config.jwt).ok();

    let role = match input.role.as_deref() {
        None => ROLE_READER.to_string(),
        Some(role) => {
            if !caller.as_ref().is_some_and(AuthUser::is_admin) {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Only administrators can assign roles".into(),
                )));
            }
            validate_role(role)?;
            role.to_string()
        }
    };

    validate_new_password(&input.password, &input.password_confirm)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let username = validate_name("Username", &input.username, MAX_USERNAME_LENGTH)?;
    let email = validate_email(&input.email)?;
    let first_name = validate_optional_name("First name", &input.first_name)?;
    let last_name = validate_optional_name("Last name", &input.last_name)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            first_name,
            last_name,
            password_hash,
            role,
        },
    )
    .await?;

    record_audit(
        &state,
        CreateAuditLog::new(
            Some(caller.map_or(user.id, |c| c.user_id)),
            actions::ENTITY_CREATE,
            entities::USER,
            user.id,
        )
        .with_new(json!({ "username": user.username, "role": user.role })),
    )
    .await;
    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(user),
        }),
    ))
}

/// GET /api/v1/users
///
/// List accounts, newest first, optionally by role. Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(role) = params.role.as_deref() {
        validate_role(role)?;
    }
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };

    let users = UserRepo::list(&state.pool, params.role.as_deref(), page.limit(), page.offset())
        .await?;
    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/users/profile
///
/// The caller's account and circulation counters.
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    let summary = DashboardRepo::reader_summary(&state.pool, auth.user_id, today()).await?;

    Ok(Json(DataResponse {
        data: ProfileResponse {
            user: user.into(),
            summary,
        },
    }))
}

/// GET /api/v1/users/{id}
///
/// Own account, or any account for librarians.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_access(id, "user")?;

    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// PUT /api/v1/users/{id}
///
/// Update profile fields. Users edit themselves; admins edit anyone and are
/// the only ones who may change `role` or `is_active`.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    if auth.user_id != id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only update your own account".into(),
        )));
    }
    if (input.role.is_some() || input.is_active.is_some()) && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only administrators can change roles or account status".into(),
        )));
    }
    if let Some(role) = input.role.as_deref() {
        validate_role(role)?;
    }

    let existing = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    let update = UpdateUser {
        username: input
            .username
            .as_deref()
            .map(|u| validate_name("Username", u, MAX_USERNAME_LENGTH))
            .transpose()?,
        email: input.email.as_deref().map(validate_email).transpose()?,
        first_name: input
            .first_name
            .as_deref()
            .map(|n| validate_optional_name("First name", n))
            .transpose()?,
        last_name: input
            .last_name
            .as_deref()
            .map(|n| validate_optional_name("Last name", n))
            .transpose()?,
        role: input.role,
        is_active: input.is_active,
    };

    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    if update.is_active == Some(false) {
        SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }

    record_audit(
        &state,
        CreateAuditLog::new(Some(auth.user_id), actions::ENTITY_UPDATE, entities::USER, id)
            .with_old(json!({
                "username": existing.username,
                "email": existing.email,
                "role": existing.role,
                "is_active": existing.is_active,
            }))
            .with_new(json!({
                "username": user.username,
                "email": user.email,
                "role": user.role,
                "is_active": user.is_active,
            })),
    )
    .await;

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// PUT /api/v1/users/{id}/password
///
/// Change a password. Users must present their current password; admins may
/// reset another user's password without it. All sessions of the account are
/// revoked. Returns 204.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let is_self = auth.user_id == id;
    if !is_self && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only change your own password".into(),
        )));
    }

    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    if is_self {
        let current = input.current_password.as_deref().ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Current password is required".into(),
            ))
        })?;
        let valid = verify_password(current, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !valid {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Current password is incorrect".into(),
            )));
        }
    }

    validate_new_password(&input.new_password, &input.new_password_confirm)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, id, &hashed).await?;
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    record_audit(
        &state,
        CreateAuditLog::new(Some(auth.user_id), actions::ENTITY_UPDATE, entities::USER, id)
            .with_new(json!({ "event": "password_changed", "by_admin": !is_self })),
    )
    .await;
    tracing::info!(user_id = id, by = auth.user_id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/{id}
///
/// Soft-deactivate an account and revoke its sessions. Admin only. Returns 204.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if admin.user_id == id {
        return Err(AppError::Core(CoreError::Conflict(
            "You cannot deactivate your own account".into(),
        )));
    }

    if !UserRepo::deactivate(&state.pool, id).await? {
        // Distinguish "already inactive" from "no such user".
        UserRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
        return Ok(StatusCode::NO_CONTENT);
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    record_audit(
        &state,
        CreateAuditLog::new(Some(admin.user_id), actions::ENTITY_DELETE, entities::USER, id)
            .with_new(json!({ "is_active": false })),
    )
    .await;
    tracing::info!(user_id = id, by = admin.user_id, "User deactivated");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_email(email: &str) -> Result<String, CoreError> {
    let email = validate_name("Email", email, MAX_EMAIL_LENGTH)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "Invalid email address '{email}'"
        )));
    }
    Ok(email.to_lowercase())
}

/// First and last names may be blank but are bounded.
fn validate_optional_name(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > MAX_PERSON_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {MAX_PERSON_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}
