pub mod email_cache;
pub mod email_filter;
pub mod leave_pdf;
pub mod notifier;
