use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    domain::{Role, parse_enum},
    dto::auth::Claims,
    error::AppError,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_seller() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Records belonging to another seller are only reachable by admins.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id != owner_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;
    let role = parse_enum::<Role>(&decoded.claims.role, "role")
        .map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser { user_id, role })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?
            .trim();

        decode_token(token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::auth_service::issue_token};

    fn config(secret: &str) -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: secret.into(),
            jwt_ttl_hours: 1,
            cors_origin: None,
            public_base_url: "http://127.0.0.1:3000".into(),
        }
    }

    #[test]
    fn issued_token_carries_user_and_role() {
        let id = Uuid::new_v4();
        let token = issue_token(&config("secret"), id, "YARD").unwrap();
        let user = decode_token(&token, "secret").unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.role, Role::Yard);
    }

    #[test]
    fn wrong_secret_or_unknown_role_is_unauthorized() {
        let id = Uuid::new_v4();
        let token = issue_token(&config("secret"), id, "YARD").unwrap();
        assert!(matches!(decode_token(&token, "other"), Err(AppError::Unauthorized)));

        let token = issue_token(&config("secret"), id, "SUPERUSER").unwrap();
        assert!(matches!(decode_token(&token, "secret"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn only_owner_or_admin_passes() {
        let owner = Uuid::new_v4();
        let seller = AuthUser { user_id: owner, role: Role::Agent };
        let other = AuthUser { user_id: Uuid::new_v4(), role: Role::Agent };
        let admin = AuthUser { user_id: Uuid::new_v4(), role: Role::Admin };

        assert!(ensure_owner_or_admin(&seller, owner).is_ok());
        assert!(ensure_owner_or_admin(&admin, owner).is_ok());
        assert!(matches!(ensure_owner_or_admin(&other, owner), Err(AppError::Forbidden)));
        assert!(ensure_seller(&admin).is_err());
    }
}
