use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::varchar_enum;

/// Lifecycle of leave and overtime requests.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

varchar_enum!(RequestStatus);

impl RequestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }
}

/// Which table a decision or notification refers to.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
pub enum RequestKind {
    Leave,
    Overtime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_column_value() {
        assert_eq!(RequestStatus::Approved.as_ref(), "APPROVED");
        assert_eq!("DENIED".parse::<RequestStatus>().unwrap(), RequestStatus::Denied);
        assert!("REJECTED".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn kinds_use_their_display_names() {
        assert_eq!("Leave".parse::<RequestKind>().unwrap(), RequestKind::Leave);
        assert_eq!("Overtime".parse::<RequestKind>().unwrap(), RequestKind::Overtime);
        assert!("leave".parse::<RequestKind>().is_err());
    }
}
