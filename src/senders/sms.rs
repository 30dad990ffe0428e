//! SMS notification channel

use async_trait::async_trait;

use super::{Sender, SenderError};
use crate::models::NotificationBatch;

/// Sends phishing-attempt alerts as text messages (e.g. via Twilio).
///
/// Delivery currently logs the batch and succeeds; the provider call goes
/// here, sending from `from_number`.
pub struct SmsSender {
    from_number: String,
}

impl SmsSender {
    pub fn new(from_number: String) -> Self {
        Self { from_number }
    }
}

#[async_trait]
impl Sender for SmsSender {
    async fn deliver(&self, batch: &NotificationBatch) -> Result<(), SenderError> {
        tracing::info!(
            channel = "sms",
            from = %self.from_number,
            records = batch.len(),
            "Sending SMS notifications"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "sms"
    }
}
