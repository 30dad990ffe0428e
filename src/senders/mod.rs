//! Notification senders

mod gmail;
mod outlook;
mod sms;
mod social;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ChannelConfig;
use crate::models::NotificationBatch;

pub use gmail::GmailSender;
pub use outlook::OutlookSender;
pub use sms::SmsSender;
pub use social::SocialSender;

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("provider rejected delivery: {0}")]
    ProviderError(String),
}

/// Trait for notification delivery channels.
///
/// Each sender delivers one batch of phishing-attempt records through its
/// channel. Senders receive the batch by shared reference and must handle
/// their own failures; the dispatcher isolates each sender so one channel
/// failing never affects the others.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn deliver(&self, batch: &NotificationBatch) -> Result<(), SenderError>;

    /// Returns the channel name of this sender for logging purposes.
    fn channel(&self) -> &'static str;
}

/// Build the enabled senders in fixed registration order:
/// Gmail, Outlook, SMS, social media.
pub fn create_enabled_senders(conf: &ChannelConfig) -> Vec<Box<dyn Sender>> {
    let mut senders: Vec<Box<dyn Sender>> = Vec::new();

    if conf.gmail_enabled {
        senders.push(Box::new(GmailSender::new(conf.gmail_sender.clone())));
    }

    if conf.outlook_enabled {
        senders.push(Box::new(OutlookSender::new(conf.outlook_sender.clone())));
    }

    if conf.sms_enabled {
        senders.push(Box::new(SmsSender::new(conf.sms_from.clone())));
    }

    if conf.social_enabled {
        senders.push(Box::new(SocialSender::new(conf.social_handle.clone())));
    }

    senders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_enabled() -> ChannelConfig {
        ChannelConfig {
            gmail_enabled: true,
            gmail_sender: "alerts@test".to_string(),
            outlook_enabled: true,
            outlook_sender: "alerts@test".to_string(),
            sms_enabled: true,
            sms_from: "+15550100000".to_string(),
            social_enabled: true,
            social_handle: "@test".to_string(),
        }
    }

    #[test]
    fn test_registration_order_is_fixed() {
        let senders = create_enabled_senders(&all_enabled());
        let channels: Vec<&str> = senders.iter().map(|s| s.channel()).collect();
        assert_eq!(channels, vec!["gmail", "outlook", "sms", "social"]);
    }

    #[test]
    fn test_disabled_channels_are_skipped() {
        let mut conf = all_enabled();
        conf.outlook_enabled = false;
        conf.sms_enabled = false;

        let senders = create_enabled_senders(&conf);
        let channels: Vec<&str> = senders.iter().map(|s| s.channel()).collect();
        assert_eq!(channels, vec!["gmail", "social"]);
    }

    #[tokio::test]
    async fn test_stub_senders_accept_empty_batch() {
        let batch = NotificationBatch::new();
        for sender in create_enabled_senders(&all_enabled()) {
            sender.deliver(&batch).await.unwrap();
        }
    }
}
