//! Alert subscribers

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::channel::AlertPublisher;
use crate::error::BusError;
use crate::event::OwnershipAlert;

/// Listener for ownership alerts
///
/// A failing handler is logged and skipped; it never blocks publishers or
/// other subscribers.
#[async_trait]
pub trait AlertSubscriber: Send + Sync {
    /// Subscriber name (for logging)
    fn name(&self) -> &str;

    async fn handle(&self, alert: &OwnershipAlert) -> Result<(), BusError>;
}

/// Drive a subscriber from the publisher until the channel closes
///
/// The receiver is attached before this returns, so alerts published
/// afterwards are delivered.
pub fn spawn_subscriber(publisher: &AlertPublisher, subscriber: Arc<dyn AlertSubscriber>) -> JoinHandle<()> {
    let mut receiver = publisher.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(alert) => {
                    if let Err(e) = subscriber.handle(&alert).await {
                        tracing::warn!(
                            subscriber = subscriber.name(),
                            asset_id = %alert.asset_id,
                            error = %e,
                            "Alert subscriber failed"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscriber = subscriber.name(), skipped, "Alert subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(subscriber = subscriber.name(), "Alert subscriber stopped");
    })
}

/// Writes every alert to the log
#[derive(Debug, Default)]
pub struct LoggingAlertSubscriber;

#[async_trait]
impl AlertSubscriber for LoggingAlertSubscriber {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, alert: &OwnershipAlert) -> Result<(), BusError> {
        tracing::warn!(
            asset_id = %alert.asset_id,
            action = %alert.action,
            risk_score = %alert.risk_score,
            flags = ?alert.flags,
            irreversible = alert.is_irreversible(),
            "Ownership alert"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rwaguard_core::{OracleScore, RecommendedAction};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Collecting {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AlertSubscriber for Collecting {
        fn name(&self) -> &str {
            "collecting"
        }

        async fn handle(&self, alert: &OwnershipAlert) -> Result<(), BusError> {
            if alert.asset_id == "POISON" {
                return Err(BusError::SubscriberFailed {
                    name: self.name().to_string(),
                    reason: "poison alert".to_string(),
                });
            }
            self.seen.lock().unwrap().push(alert.asset_id.clone());
            Ok(())
        }
    }

    fn alert(asset_id: &str) -> OwnershipAlert {
        OwnershipAlert {
            asset_id: asset_id.to_string(),
            action: RecommendedAction::Escalate,
            risk_score: OracleScore::ZERO,
            flags: vec![],
            raised_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failing_alert_does_not_stop_subscriber() {
        let publisher = AlertPublisher::default();
        let collecting = Arc::new(Collecting::default());
        let handle = spawn_subscriber(&publisher, collecting.clone());

        publisher.publish(alert("RWA-001"));
        publisher.publish(alert("POISON"));
        publisher.publish(alert("RWA-002"));
        drop(publisher);

        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(*collecting.seen.lock().unwrap(), vec!["RWA-001", "RWA-002"]);
    }

    #[tokio::test]
    async fn test_logging_subscriber() {
        let alert = alert("RWA-001");
        assert!(LoggingAlertSubscriber.handle(&alert).await.is_ok());
    }
}
