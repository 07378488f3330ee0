//! Authentication middleware
//!
//! Bearer-token authentication and permission checks. Tokens are issued
//! by the login service in front of this API; here they are only verified
//! and turned into the actor every engine call receives.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::Actor;

use crate::error::AppError;
use crate::AppState;

/// Role that bypasses permission checks and the cancelled-order edit freeze
pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

/// Permission required for category and item mutations
pub const MANAGE_INVENTORY: &str = "manage-inventory";

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|r| r == SUPER_ADMIN_ROLE)
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_super_admin() || self.permissions.iter().any(|p| p == permission)
    }

    /// Fail with `InsufficientPermissions` unless the permission is held
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Fail with `InsufficientPermissions` unless the user is a Super Admin
    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Actor context threaded into engine operations
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.is_super_admin())
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let auth_user = AuthUser {
        user_id,
        name: claims.name,
        roles: claims.roles,
        permissions: claims.permissions,
    };

    tracing::debug!(
        user_id = %auth_user.user_id,
        name = auth_user.name.as_deref().unwrap_or("-"),
        "Authenticated request"
    );
    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn user(roles: &[&str], permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: uuid::Uuid::new_v4(),
            name: None,
            roles: roles.iter().map(|s| s.to_string()).collect(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_super_admin_has_every_permission() {
        let admin = user(&[SUPER_ADMIN_ROLE], &[]);
        assert!(admin.has_permission(MANAGE_INVENTORY));
        assert!(admin.actor().is_privileged());
    }

    #[test]
    fn test_regular_user_permissions() {
        let cashier = user(&["Cashier"], &[]);
        assert!(!cashier.has_permission(MANAGE_INVENTORY));
        assert!(cashier.require_permission(MANAGE_INVENTORY).is_err());
        assert!(!cashier.actor().is_privileged());

        let stocker = user(&["Stocker"], &[MANAGE_INVENTORY]);
        assert!(stocker.require_permission(MANAGE_INVENTORY).is_ok());
    }

    #[test]
    fn test_supplies_need_super_admin() {
        assert!(user(&[SUPER_ADMIN_ROLE], &[]).require_super_admin().is_ok());
        let stocker = user(&["Stocker"], &[MANAGE_INVENTORY]);
        assert!(stocker.require_super_admin().is_err());
    }

    #[test]
    fn test_decode_jwt_round_trip() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            name: Some("Ana".to_string()),
            roles: vec![SUPER_ADMIN_ROLE.to_string()],
            permissions: vec![],
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let decoded = decode_jwt(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.roles, claims.roles);
        assert!(decode_jwt(&token, "other-secret").is_err());
    }
}
