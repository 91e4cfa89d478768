use crate::{error::AppError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Unauthorized")),
        )
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.role.is_privileged() {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/Admin only"))
        }
    }

    /// Owners see their own records; HR and admins see everyone's.
    pub fn require_owner_or_privileged(&self, owner_id: u64) -> Result<(), AppError> {
        if self.user_id == owner_id || self.role.is_privileged() {
            Ok(())
        } else {
            Err(AppError::forbidden("Forbidden"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, role: Role) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("user{id}@company.com"),
            name: format!("User {id}"),
            role,
        }
    }

    #[test]
    fn employees_cannot_read_other_employees_requests() {
        let err = user(1, Role::Employee)
            .require_owner_or_privileged(2)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn owners_and_privileged_roles_can_read() {
        assert!(user(1, Role::Employee).require_owner_or_privileged(1).is_ok());
        assert!(user(1, Role::Hr).require_owner_or_privileged(2).is_ok());
        assert!(user(1, Role::Admin).require_owner_or_privileged(2).is_ok());
    }

    #[test]
    fn decisions_need_hr_or_admin() {
        assert!(user(1, Role::Employee).require_hr_or_admin().is_err());
        assert!(user(1, Role::Hr).require_hr_or_admin().is_ok());
    }
}
