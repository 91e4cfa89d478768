use std::time::Duration;

pub struct PasswordResetMessage {}
pub struct LeaveApprovedMessage {}

impl PasswordResetMessage {
    pub fn generate(reset_url: &str, company_name: &str, token_lifetime: Duration) -> String {
        format!(
            "<div style=\"font-family: Arial, sans-serif; line-height: 1.6;\">
               <h2>Password Reset Request</h2>
               <p>You are receiving this email because a password reset request was made \
               for your account.</p>
               <p>Please click the button below to reset your password. This link is valid \
               for {} minutes.</p>
               <a href=\"{}\" style=\"background-color: #007bff; color: white; padding: 10px 20px; \
               text-decoration: none; border-radius: 5px; display: inline-block;\">Reset Password</a>
               <p>If you did not request a password reset, you can safely ignore this email.</p>
               <p>Thank you,</p>
               <p><strong>{}</strong></p>
             </div>",
            token_lifetime.as_secs() / 60,
            reset_url,
            company_name,
        )
    }
}

impl LeaveApprovedMessage {
    pub fn generate(employee_name: &str, company_name: &str) -> String {
        format!(
            "<p>Dear {},</p>
             <p>Your leave request has been approved. Please find the official document \
             attached.</p>
             <p><strong>{}</strong></p>",
            employee_name, company_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_message_links_and_states_lifetime() {
        let html = PasswordResetMessage::generate(
            "https://hr.example.com/reset-password?token=abc",
            "Example Ltd",
            Duration::from_secs(3600),
        );

        assert!(html.contains("https://hr.example.com/reset-password?token=abc"));
        assert!(html.contains("valid for 60 minutes"));
        assert!(html.contains("Example Ltd"));
    }
}
