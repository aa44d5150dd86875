//! Email service for booking notifications

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use super::notifications::{BookingNotification, Notifier};
use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> AppResult<Message> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Staybook");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><p>{}</p></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }

    fn mailer(&self) -> AppResult<SmtpTransport> {
        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(mailer_builder.build())
    }

    /// Send one email; the SMTP exchange runs on the blocking pool
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let email = self.build_message(to, subject, body)?;
        let mailer = self.mailer()?;

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn notify(&self, notification: &BookingNotification) -> AppResult<()> {
        self.send_email(
            &notification.recipient_email,
            notification.subject(),
            &notification.body(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let service = EmailService::new(EmailConfig::default());
        assert!(service.build_message("guest@example.com", "Hi", "Body").is_ok());
        assert!(matches!(
            service.build_message("not an address", "Hi", "Body"),
            Err(AppError::Internal(_))
        ));
    }
}
