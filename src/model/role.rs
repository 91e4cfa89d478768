use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::varchar_enum;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Hr,
    Employee,
}

varchar_enum!(Role);

impl Role {
    /// Admin and HR share every privileged operation.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_values() {
        assert_eq!("HR".parse::<Role>().unwrap(), Role::Hr);
        assert_eq!(Role::Employee.as_ref(), "EMPLOYEE");
        assert!("MANAGER".parse::<Role>().is_err());
    }

    #[test]
    fn only_admin_and_hr_are_privileged() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::Hr.is_privileged());
        assert!(!Role::Employee.is_privileged());
    }
}
