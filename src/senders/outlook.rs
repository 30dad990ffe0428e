//! Outlook notification channel

use async_trait::async_trait;

use super::{Sender, SenderError};
use crate::models::NotificationBatch;

/// Sends phishing-attempt alerts through the Outlook (Microsoft Graph) API.
///
/// Delivery currently logs the batch and succeeds; the Graph sendMail call
/// goes here.
pub struct OutlookSender {
    sender_address: String,
}

impl OutlookSender {
    pub fn new(sender_address: String) -> Self {
        Self { sender_address }
    }
}

#[async_trait]
impl Sender for OutlookSender {
    async fn deliver(&self, batch: &NotificationBatch) -> Result<(), SenderError> {
        tracing::info!(
            channel = "outlook",
            from = %self.sender_address,
            records = batch.len(),
            "Sending Outlook notifications"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "outlook"
    }
}
