//! JWT-based authentication extractor for Axum handlers.
//!
//! The access token is read from `Authorization: Bearer <token>` and, when
//! that header is absent, from the `access_token` cookie set at login.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use biblio_core::error::CoreError;
use biblio_core::roles::{is_librarian, ROLE_ADMIN};
use biblio_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authenticated user extracted from the access token.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// `reader`, `secretary` or `admin`.
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_librarian(&self) -> bool {
        is_librarian(&self.role)
    }

    /// The caller may act on resources owned by `owner_id`: it is theirs, or
    /// they are a librarian.
    pub fn can_access(&self, owner_id: DbId) -> bool {
        self.user_id == owner_id || self.is_librarian()
    }

    /// Reject with 403 unless [`Self::can_access`] holds.
    pub fn ensure_access(&self, owner_id: DbId, entity: &str) -> Result<(), AppError> {
        if self.can_access(owner_id) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "You do not have access to this {entity}"
            ))))
        }
    }
}

/// Authenticate from raw request headers.
///
/// Used directly by handlers where authentication is optional.
pub fn authenticate(headers: &HeaderMap, config: &JwtConfig) -> Result<AuthUser, AppError> {
    let token = extract_token(headers)?;
    let claims = validate_token(token, config).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let header = value.to_str().unwrap_or_default();
        return header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        });
    }

    cookie_value(headers, ACCESS_TOKEN_COOKIE).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Missing Authorization header".into(),
        ))
    })
}

/// Find a cookie by name across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::auth::jwt::generate_access_token;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "middleware-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn headers(pairs: &[(axum::http::HeaderName, String)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_is_accepted() {
        let token = generate_access_token(3, "reader", &config()).unwrap();
        let user = authenticate(
            &headers(&[(AUTHORIZATION, format!("Bearer {token}"))]),
            &config(),
        )
        .unwrap();
        assert_eq!(user.user_id, 3);
        assert!(!user.is_librarian());
    }

    #[test]
    fn cookie_is_used_when_header_absent() {
        let token = generate_access_token(9, "secretary", &config()).unwrap();
        let user = authenticate(
            &headers(&[(COOKIE, format!("theme=dark; access_token={token}"))]),
            &config(),
        )
        .unwrap();
        assert_eq!(user.user_id, 9);
        assert!(user.is_librarian());
        assert!(!user.is_admin());
    }

    #[test]
    fn malformed_header_does_not_fall_back_to_cookie() {
        let token = generate_access_token(9, "reader", &config()).unwrap();
        let result = authenticate(
            &headers(&[
                (AUTHORIZATION, format!("Token {token}")),
                (COOKIE, format!("access_token={token}")),
            ]),
            &config(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(authenticate(&HeaderMap::new(), &config()).is_err());
        assert!(authenticate(&headers(&[(COOKIE, "access_token=".to_string())]), &config()).is_err());
    }

    #[test]
    fn owners_and_librarians_have_access() {
        let reader = AuthUser {
            user_id: 1,
            role: "reader".to_string(),
        };
        let admin = AuthUser {
            user_id: 2,
            role: "admin".to_string(),
        };
        assert!(reader.can_access(1));
        assert!(!reader.can_access(5));
        assert!(admin.can_access(5));
        assert!(reader.ensure_access(5, "loan").is_err());
    }
}
