//! Change-driven notification watcher
//!
//! One process-owned subscription over the phishing_attempts table. The
//! watcher listens on the trigger's notification channel, re-runs the
//! filtered query on every change, projects the rows and fans the batch out
//! to all registered senders. It never writes an HTTP response; the read
//! path answers requests from its own point-in-time queries.

use std::time::Duration;

use sqlx::postgres::PgListener;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db;
use crate::models::{project_all, AttemptFilter, NotificationBatch, PhishingAttempt};
use crate::senders::Sender;

/// Backoff after the store reports a subscription error.
const RECV_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to establish change subscription: {0}")]
    Subscribe(#[from] sqlx::Error),
}

/// Outcome of one sender's delivery attempt for one snapshot.
#[derive(Debug)]
pub struct DeliveryReport {
    pub channel: &'static str,
    pub ok: bool,
    pub error: Option<String>,
}

/// Dispatch a batch to every sender in registration order.
///
/// Each sender's failure is caught and recorded; the remaining senders
/// still run. Delivery is a side effect and must never fail the data path.
pub async fn dispatch_batch(
    senders: &[Box<dyn Sender>],
    batch: &NotificationBatch,
) -> Vec<DeliveryReport> {
    let mut reports = Vec::with_capacity(senders.len());

    for sender in senders {
        match sender.deliver(batch).await {
            Ok(()) => {
                reports.push(DeliveryReport {
                    channel: sender.channel(),
                    ok: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::error!(
                    channel = sender.channel(),
                    error = %e,
                    "Notification delivery failed"
                );
                reports.push(DeliveryReport {
                    channel: sender.channel(),
                    ok: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    reports
}

/// The change-driven notifier, prior to subscription.
pub struct Watcher {
    pool: PgPool,
    filter: AttemptFilter,
    senders: Vec<Box<dyn Sender>>,
}

/// Cancellation handle for an active watcher subscription.
pub struct WatcherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Close the subscription and wait for the watcher task to stop.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl Watcher {
    pub fn new(pool: PgPool, filter: AttemptFilter, senders: Vec<Box<dyn Sender>>) -> Self {
        Self {
            pool,
            filter,
            senders,
        }
    }

    /// Establish the change subscription and spawn the watch loop.
    ///
    /// Setup failures (connect/LISTEN) are returned to the caller; errors on
    /// the active subscription are logged inside the loop and never kill
    /// the process.
    pub async fn subscribe(self) -> Result<WatcherHandle, WatchError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(db::CHANGE_CHANNEL).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(listener, shutdown_rx));

        Ok(WatcherHandle {
            shutdown: shutdown_tx,
            task,
        })
    }

    async fn run(self, mut listener: PgListener, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            category = self.filter.category().unwrap_or("*"),
            channels = self.senders.len(),
            "Change watcher active"
        );

        // The initial baseline snapshot is dispatched like any later change.
        self.deliver_snapshot().await;

        loop {
            tokio::select! {
                result = listener.recv() => match result {
                    Ok(_notification) => self.deliver_snapshot().await,
                    Err(e) => {
                        // PgListener reconnects on its own; back off and
                        // keep the subscription alive.
                        tracing::error!(error = %e, "Change subscription error");
                        tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    }
                },
                _ = shutdown.changed() => {
                    tracing::info!("Change watcher closed");
                    return;
                }
            }
        }
    }

    /// Take one snapshot of the watched view and fan it out.
    async fn deliver_snapshot(&self) {
        let attempts = match PhishingAttempt::list(&self.pool, &self.filter).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Snapshot query failed");
                return;
            }
        };

        let batch = project_all(&attempts);
        let reports = dispatch_batch(&self.senders, &batch).await;

        let failed = reports.iter().filter(|r| !r.ok).count();
        if failed > 0 {
            tracing::warn!(
                records = batch.len(),
                failed,
                total = reports.len(),
                "Snapshot dispatched with channel failures"
            );
        } else {
            tracing::info!(
                records = batch.len(),
                channels = reports.len(),
                "Snapshot dispatched"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttemptRecord;
    use crate::senders::SenderError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    struct RecordingSender {
        calls: Arc<Mutex<Vec<NotificationBatch>>>,
    }

    #[async_trait]
    impl Sender for RecordingSender {
        async fn deliver(&self, batch: &NotificationBatch) -> Result<(), SenderError> {
            self.calls.lock().unwrap().push(batch.clone());
            Ok(())
        }

        fn channel(&self) -> &'static str {
            "recording"
        }
    }

    struct FailingSender {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Sender for FailingSender {
        async fn deliver(&self, _batch: &NotificationBatch) -> Result<(), SenderError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SenderError::ProviderError("quota exceeded".to_string()))
        }

        fn channel(&self) -> &'static str {
            "failing"
        }
    }

    fn sample_batch() -> NotificationBatch {
        let record = AttemptRecord {
            id: Uuid::new_v4(),
            fields: match json!({ "category": "smishing", "url": "https://evil.example" }) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            },
        };
        vec![record]
    }

    #[tokio::test]
    async fn test_each_sender_invoked_exactly_once_with_full_batch() {
        let calls_a = Arc::new(Mutex::new(Vec::new()));
        let calls_b = Arc::new(Mutex::new(Vec::new()));
        let senders: Vec<Box<dyn Sender>> = vec![
            Box::new(RecordingSender {
                calls: calls_a.clone(),
            }),
            Box::new(RecordingSender {
                calls: calls_b.clone(),
            }),
        ];

        let batch = sample_batch();
        let reports = dispatch_batch(&senders, &batch).await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.ok));
        assert_eq!(*calls_a.lock().unwrap(), vec![batch.clone()]);
        assert_eq!(*calls_b.lock().unwrap(), vec![batch]);
    }

    #[tokio::test]
    async fn test_failing_sender_does_not_block_the_rest() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let senders: Vec<Box<dyn Sender>> = vec![
            Box::new(FailingSender {
                attempts: attempts.clone(),
            }),
            Box::new(RecordingSender {
                calls: calls.clone(),
            }),
        ];

        let batch = sample_batch();
        let reports = dispatch_batch(&senders, &batch).await;

        // The failure was attempted, recorded, and isolated
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(calls.lock().unwrap().len(), 1);

        assert_eq!(reports[0].channel, "failing");
        assert!(!reports[0].ok);
        assert!(reports[0].error.as_deref().unwrap().contains("quota exceeded"));

        assert_eq!(reports[1].channel, "recording");
        assert!(reports[1].ok);
        assert!(reports[1].error.is_none());
    }

    #[tokio::test]
    async fn test_reports_follow_registration_order() {
        let senders: Vec<Box<dyn Sender>> = vec![
            Box::new(RecordingSender {
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(FailingSender {
                attempts: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(RecordingSender {
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
        ];

        let reports = dispatch_batch(&senders, &sample_batch()).await;
        let channels: Vec<&str> = reports.iter().map(|r| r.channel).collect();
        assert_eq!(channels, vec!["recording", "failing", "recording"]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_still_dispatched() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let senders: Vec<Box<dyn Sender>> = vec![Box::new(RecordingSender {
            calls: calls.clone(),
        })];

        let reports = dispatch_batch(&senders, &NotificationBatch::new()).await;

        assert!(reports[0].ok);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(calls.lock().unwrap()[0].is_empty());
    }
}
