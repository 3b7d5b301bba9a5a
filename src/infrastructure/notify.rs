use crate::domain::ports::{Notification, NotificationDispatcher};
use crate::error::Result;
use async_trait::async_trait;

/// Dispatcher for deployments without a push channel: notifications land in
/// the structured log instead of being dropped silently.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            user_id = %notification.user_id,
            kind = ?notification.kind,
            title = %notification.title,
            message = %notification.message,
            "notification"
        );
        Ok(())
    }
}
