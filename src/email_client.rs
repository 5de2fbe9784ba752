use serde::Serialize;

use crate::error::{AppError, EmailError};
use crate::validators::is_valid_email;

/// HTTP client for the external mail delivery service.
///
/// The only mail this service sends is the password recovery message; the
/// delivery provider is an external collaborator reached over JSON/HTTP.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

#[derive(Clone)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let email = is_valid_email(&s).map_err(|e| format!("{:?}", e))?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach email service: {}", e);
                AppError::Email(EmailError::ServiceUnavailable(e.to_string()))
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                AppError::Email(EmailError::SendFailed(e.to_string()))
            })?;

        Ok(())
    }

    /// Send the password recovery mail carrying the one-time reset token.
    pub async fn send_password_reset(&self, recipient: &str, token: &str) -> Result<(), AppError> {
        let html = format!(
            "<p>A password reset was requested for your account.</p>\
             <p>Use this token to set a new password: <strong>{}</strong></p>\
             <p>The token expires in 30 minutes. If you did not request a \
             reset, you can ignore this message.</p>",
            token
        );
        self.send_email(recipient, "Reset your password", &html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_parse_accepts_valid_email() {
        assert!(SenderEmail::parse("noreply@bookstore.example".to_string()).is_ok());
    }

    #[test]
    fn sender_parse_rejects_invalid_email() {
        assert!(SenderEmail::parse("not-an-email".to_string()).is_err());
    }
}
