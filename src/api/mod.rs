pub mod dashboard;
pub mod leave_request;
pub mod notifications;
pub mod overtime_request;
pub mod profile;
pub mod requests;
pub mod users;
pub mod verify;
