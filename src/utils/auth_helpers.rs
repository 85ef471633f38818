//! School-scoping helpers shared by controllers.
//!
//! Super admins have no school of their own and must name one explicitly
//! when an operation needs a scope; everyone else is pinned to the school
//! on their token.

use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

/// The school filter to apply to a query: `None` means unscoped (super
/// admins see everything).
pub fn school_scope(auth_user: &AuthUser) -> Option<Uuid> {
    if auth_user.role() == UserRole::SuperAdmin {
        None
    } else {
        auth_user.school_id()
    }
}

/// Resolve the school an operation acts on. Super admins must pass one;
/// school-scoped users always act on their own.
pub fn resolve_school_id(
    auth_user: &AuthUser,
    requested: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if auth_user.role() == UserRole::SuperAdmin {
        return requested.ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("school_id is required for super admins"))
        });
    }

    auth_user
        .school_id()
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("User has no school assigned")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::model::Claims;

    fn auth_user(role: UserRole, school_id: Option<Uuid>) -> AuthUser {
        AuthUser(Claims {
            sub: Uuid::new_v4().to_string(),
            name: "Test User".to_string(),
            role,
            base_role: role,
            school_id,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_super_admin_is_unscoped() {
        let admin = auth_user(UserRole::SuperAdmin, None);
        assert_eq!(school_scope(&admin), None);
    }

    #[test]
    fn test_principal_is_pinned_to_own_school() {
        let school_id = Uuid::new_v4();
        let principal = auth_user(UserRole::Principal, Some(school_id));

        assert_eq!(school_scope(&principal), Some(school_id));
        // A requested school_id must not widen the scope.
        assert_eq!(
            resolve_school_id(&principal, Some(Uuid::new_v4())).unwrap(),
            school_id
        );
    }

    #[test]
    fn test_super_admin_must_name_a_school() {
        let admin = auth_user(UserRole::SuperAdmin, None);
        assert!(resolve_school_id(&admin, None).is_err());

        let school_id = Uuid::new_v4();
        assert_eq!(resolve_school_id(&admin, Some(school_id)).unwrap(), school_id);
    }
}
