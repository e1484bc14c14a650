use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ApplicationSettings;
use crate::errors::InternalError;
use crate::errors::internal::NotificationError;

/// Who an email goes to
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// Values substituted into a template
#[derive(Debug, Clone, PartialEq)]
pub struct EmailData {
    pub url: String,
    pub first_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    VerificationCode,
    ResetPassword,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::VerificationCode => "verificationCode",
            EmailTemplate::ResetPassword => "resetPassword",
        }
    }

    /// Plain text body
    pub fn render_text(&self, data: &EmailData) -> String {
        match self {
            EmailTemplate::VerificationCode => format!(
                "Hi {},\n\nPlease verify your account to be able to sign in:\n{}\n",
                data.first_name, data.url
            ),
            EmailTemplate::ResetPassword => format!(
                "Hi {},\n\nForgot your password? Reset it here (valid for 15 minutes):\n{}\n\n\
                 If you did not ask for a reset, ignore this email.\n",
                data.first_name, data.url
            ),
        }
    }

    pub fn render_html(&self, data: &EmailData) -> String {
        let (intro, action) = match self {
            EmailTemplate::VerificationCode => (
                "Please verify your account to be able to sign in.",
                "Verify your account",
            ),
            EmailTemplate::ResetPassword => (
                "Forgot your password? The link below is valid for 15 minutes.",
                "Reset password",
            ),
        };

        format!(
            "<!DOCTYPE html><html><body><p>Hi {},</p><p>{}</p>\
             <p><a href=\"{}\">{}</a></p></body></html>",
            data.first_name, intro, data.url, action
        )
    }
}

impl fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outbound notification gateway
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_templated_email(
        &self,
        recipient: &Recipient,
        template: EmailTemplate,
        data: &EmailData,
    ) -> Result<(), InternalError>;
}

/// Development mailer: writes the rendered email to the log
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_templated_email(
        &self,
        recipient: &Recipient,
        template: EmailTemplate,
        data: &EmailData,
    ) -> Result<(), InternalError> {
        tracing::info!(
            "Email [{}] to {} <{}>: {}\n{}",
            template,
            recipient.name,
            recipient.email,
            data.subject,
            template.render_text(data)
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text: String,
    html: String,
}

/// Delivers email through the Mailtrap send API
pub struct MailtrapMailer {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    from: String,
}

impl MailtrapMailer {
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_token: api_token.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for MailtrapMailer {
    async fn send_templated_email(
        &self,
        recipient: &Recipient,
        template: EmailTemplate,
        data: &EmailData,
    ) -> Result<(), InternalError> {
        let request = SendRequest {
            from: Address {
                email: &self.from,
                name: "Ramen",
            },
            to: vec![Address {
                email: &recipient.email,
                name: &recipient.name,
            }],
            subject: &data.subject,
            text: template.render_text(data),
            html: template.render_html(data),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery {
                recipient: recipient.email.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                recipient: recipient.email.clone(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        tracing::debug!("Sent {} email to {}", template, recipient.email);
        Ok(())
    }
}

impl fmt::Debug for MailtrapMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailtrapMailer")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

/// An email captured by `RecordingMailer`
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub recipient: Recipient,
    pub template: EmailTemplate,
    pub data: EmailData,
}

/// Keeps every email in memory instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Most recent email of the given template sent to `email`
    pub fn last_to(&self, email: &str, template: EmailTemplate) -> Option<SentEmail> {
        self.sent()
            .into_iter()
            .rev()
            .find(|sent| sent.recipient.email == email && sent.template == template)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_templated_email(
        &self,
        recipient: &Recipient,
        template: EmailTemplate,
        data: &EmailData,
    ) -> Result<(), InternalError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentEmail {
                recipient: recipient.clone(),
                template,
                data: data.clone(),
            });
        Ok(())
    }
}

/// Mailtrap when an API token is configured, the log otherwise
pub fn mailer_from_settings(settings: &ApplicationSettings) -> Arc<dyn Mailer> {
    match settings.mailtrap_api_token() {
        Some(token) => {
            tracing::info!("Email delivery via Mailtrap at {}", settings.mailtrap_api_url());
            Arc::new(MailtrapMailer::new(
                settings.mailtrap_api_url(),
                token,
                settings.email_from(),
            ))
        }
        None => {
            tracing::info!("MAILTRAP_API_TOKEN not set, emails will be logged");
            Arc::new(LogMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> EmailData {
        EmailData {
            url: "http://localhost:3000/verifyemail/abc123".to_string(),
            first_name: "Aiko".to_string(),
            subject: "Your account verification code".to_string(),
        }
    }

    #[test]
    fn test_templates_embed_link_and_name() {
        for template in [EmailTemplate::VerificationCode, EmailTemplate::ResetPassword] {
            let text = template.render_text(&data());
            let html = template.render_html(&data());

            assert!(text.contains("Aiko"));
            assert!(text.contains("/verifyemail/abc123"));
            assert!(html.contains("href=\"http://localhost:3000/verifyemail/abc123\""));
        }
    }

    #[test]
    fn test_template_names() {
        assert_eq!(EmailTemplate::VerificationCode.name(), "verificationCode");
        assert_eq!(EmailTemplate::ResetPassword.name(), "resetPassword");
    }

    #[tokio::test]
    async fn test_recording_mailer_keeps_emails() {
        let mailer = RecordingMailer::new();
        let recipient = Recipient {
            email: "aiko@example.com".to_string(),
            name: "Aiko Tanaka".to_string(),
        };

        mailer
            .send_templated_email(&recipient, EmailTemplate::VerificationCode, &data())
            .await
            .unwrap();

        assert_eq!(mailer.sent().len(), 1);
        let last = mailer.last_to("aiko@example.com", EmailTemplate::VerificationCode).unwrap();
        assert_eq!(last.data.first_name, "Aiko");
        assert!(mailer.last_to("aiko@example.com", EmailTemplate::ResetPassword).is_none());
    }

    #[test]
    fn test_send_request_shape() {
        let request = SendRequest {
            from: Address {
                email: "noreply@ramen.local",
                name: "Ramen",
            },
            to: vec![Address {
                email: "aiko@example.com",
                name: "Aiko Tanaka",
            }],
            subject: "Hello",
            text: "plain".to_string(),
            html: "<p>html</p>".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["from"]["email"], "noreply@ramen.local");
        assert_eq!(value["to"][0]["name"], "Aiko Tanaka");
        assert_eq!(value["subject"], "Hello");
        assert_eq!(value["html"], "<p>html</p>");
    }

    #[test]
    fn test_mailtrap_debug_hides_token() {
        let mailer = MailtrapMailer::new("https://example.test/send", "secret-token", "noreply@ramen.local");
        assert!(!format!("{:?}", mailer).contains("secret-token"));
    }
}
