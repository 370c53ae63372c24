//! Gmail delivery adapter

use application::error::ApplicationError;
use application::ports::EmailPort;
use async_trait::async_trait;
use domain::EmailAddress;
use integration_email::{EmailError, SmtpClient};
use tracing::{debug, instrument};

/// Report delivery via the Gmail SMTP client
#[derive(Debug)]
pub struct GmailEmailAdapter {
    client: SmtpClient,
}

impl GmailEmailAdapter {
    #[must_use]
    pub const fn new(client: SmtpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmailPort for GmailEmailAdapter {
    #[instrument(skip(self, body))]
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), ApplicationError> {
        let message_id = self
            .client
            .send(to.as_str(), subject, body)
            .await
            .map_err(map_email_error)?;
        debug!(%message_id, "report delivered");
        Ok(())
    }
}

fn map_email_error(err: EmailError) -> ApplicationError {
    match err {
        // an app password that stopped working needs operator action
        EmailError::AuthenticationFailed => {
            ApplicationError::Configuration("SMTP credentials rejected".to_string())
        },
        other => ApplicationError::ExternalService(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_credentials_map_to_configuration() {
        let err = map_email_error(EmailError::AuthenticationFailed);
        assert!(matches!(err, ApplicationError::Configuration(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn connection_failures_are_retryable() {
        let err = map_email_error(EmailError::ConnectionFailed("timeout".to_string()));
        assert!(err.is_retryable());
    }
}
