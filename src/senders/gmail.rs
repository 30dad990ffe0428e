//! Gmail notification channel

use async_trait::async_trait;

use super::{Sender, SenderError};
use crate::models::NotificationBatch;

/// Sends phishing-attempt alerts through the Gmail API.
///
/// The actual API call is not wired up yet; delivery currently logs the
/// batch and succeeds. A real implementation authenticates as
/// `sender_address` and sends one digest message per batch.
pub struct GmailSender {
    sender_address: String,
}

impl GmailSender {
    pub fn new(sender_address: String) -> Self {
        Self { sender_address }
    }
}

#[async_trait]
impl Sender for GmailSender {
    async fn deliver(&self, batch: &NotificationBatch) -> Result<(), SenderError> {
        tracing::info!(
            channel = "gmail",
            from = %self.sender_address,
            records = batch.len(),
            "Sending Gmail notifications"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "gmail"
    }
}
