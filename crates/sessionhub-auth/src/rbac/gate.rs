//! Pure role checks run after authentication and before handlers.

use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_entity::user::UserRole;

/// `true` when `role` is one of `required`.
pub fn allowed(role: UserRole, required: &[UserRole]) -> bool {
    required.contains(&role)
}

/// Named role requirements attached to routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any signed-in user.
    AnyAuthenticated,
    /// Paid tier only.
    ProOnly,
}

impl RoleRequirement {
    /// Roles accepted by this requirement.
    pub fn roles(&self) -> &'static [UserRole] {
        match self {
            Self::AnyAuthenticated => &UserRole::ALL,
            Self::ProOnly => &[UserRole::Pro],
        }
    }

    /// Fails with `Forbidden`, carrying required and actual roles, when `role` is not accepted.
    pub fn authorize(&self, role: UserRole) -> AppResult<()> {
        let required = self.roles();
        if allowed(role, required) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                required.iter().map(|r| r.to_string()).collect(),
                role.to_string(),
            ))
        }
    }
}
