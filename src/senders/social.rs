//! Social media notification channel

use async_trait::async_trait;

use super::{Sender, SenderError};
use crate::models::NotificationBatch;

/// Posts phishing-attempt alerts to a social media account.
///
/// Delivery currently logs the batch and succeeds; the posting API call
/// goes here, publishing as `handle`.
pub struct SocialSender {
    handle: String,
}

impl SocialSender {
    pub fn new(handle: String) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Sender for SocialSender {
    async fn deliver(&self, batch: &NotificationBatch) -> Result<(), SenderError> {
        tracing::info!(
            channel = "social",
            account = %self.handle,
            records = batch.len(),
            "Posting to social media"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "social"
    }
}
