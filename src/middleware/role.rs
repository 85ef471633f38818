//! Role-based authorization for Axum routes.
//!
//! Two approaches are provided:
//! 1. Layer-based middleware (`require_super_admin`, `require_admin`) for
//!    whole routers
//! 2. Helper functions (`check_any_role`) for per-handler checks

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Middleware function that checks if the authenticated user's effective
/// role is one of `allowed_roles`.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<UserRole>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required roles: {:?}, but user has role: {:?}",
            allowed_roles,
            auth_user.role()
        )));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Guard for super-admin-only routes.
pub async fn require_super_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(State(state), req, next, vec![UserRole::SuperAdmin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Guard for admin routes (super admins and principals).
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(
        State(state),
        req,
        next,
        vec![UserRole::SuperAdmin, UserRole::Principal],
    )
    .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Check that the user's effective role is one of `allowed_roles`, for use
/// inside controllers where routes mix access levels.
pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required roles: {:?}, but user has role: {:?}",
            allowed_roles,
            auth_user.role()
        )));
    }

    Ok(())
}

/// Check a single required role.
pub fn check_role(auth_user: &AuthUser, required_role: UserRole) -> Result<(), AppError> {
    if auth_user.role() != required_role {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required role: {:?}, but user has role: {:?}",
            required_role,
            auth_user.role()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::model::Claims;
    use uuid::Uuid;

    fn auth_user_with_role(role: UserRole) -> AuthUser {
        AuthUser(Claims {
            sub: Uuid::new_v4().to_string(),
            name: "Test User".to_string(),
            role,
            base_role: role,
            school_id: None,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_check_any_role() {
        let principal = auth_user_with_role(UserRole::Principal);

        assert!(check_any_role(&principal, &[UserRole::SuperAdmin, UserRole::Principal]).is_ok());
        assert!(check_any_role(&principal, &[UserRole::Teacher]).is_err());
    }

    #[test]
    fn test_check_role() {
        let teacher = auth_user_with_role(UserRole::Teacher);

        assert!(check_role(&teacher, UserRole::Teacher).is_ok());
        assert!(check_role(&teacher, UserRole::Principal).is_err());
    }
}
