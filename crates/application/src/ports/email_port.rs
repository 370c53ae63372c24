//! Outbound email port

use async_trait::async_trait;
use domain::EmailAddress;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for sending report emails
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmailPort: Send + Sync {
    /// Send a plain-text email to a single recipient
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn EmailPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn EmailPort>();
    }
}
