/// Event notifier - the call-sites' view of the dashboard
///
/// Producers (webhooks, the activity feed) hand over an event and move on.
/// Incident and delivery events also schedule an immediate metrics refresh
/// so counters on passive screens catch up without waiting for the timer.
use std::sync::Arc;

use super::broadcast::Broadcaster;
use super::message::Update;
use super::payloads::{ActivityEvent, DeliveryEvent, IncidentEvent};
use super::refresher::Refresher;

#[derive(Clone)]
pub struct EventNotifier {
    broadcaster: Broadcaster,
    refresher: Arc<Refresher>,
}

impl EventNotifier {
    pub fn new(broadcaster: Broadcaster, refresher: Arc<Refresher>) -> Self {
        Self {
            broadcaster,
            refresher,
        }
    }

    pub fn notify_incident(&self, incident: IncidentEvent) {
        self.broadcaster.broadcast(&Update::incident(incident));
        self.refresher.trigger();
    }

    pub fn notify_delivery(&self, delivery: DeliveryEvent) {
        self.broadcaster.broadcast(&Update::delivery(delivery));
        self.refresher.trigger();
    }

    pub fn notify_activity(&self, activity: ActivityEvent) {
        self.broadcaster.broadcast(&Update::activity(activity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::message::{Topic, UpdateKind};
    use crate::dashboard::metrics::DashboardMetrics;
    use crate::dashboard::registry::{Connection, ConnectionId, ConnectionRegistry};
    use crate::dashboard::testing::{FakeProvider, RecordingTransport};
    use serde_json::Map;
    use std::time::Duration;

    fn notifier(
        registry: &Arc<ConnectionRegistry>,
        provider: &Arc<FakeProvider>,
    ) -> EventNotifier {
        let metrics = DashboardMetrics::new();
        let broadcaster = Broadcaster::new(Arc::clone(registry), Arc::clone(&metrics));
        let refresher = Refresher::new(
            Arc::clone(registry),
            provider.clone(),
            broadcaster.clone(),
            metrics,
        );
        EventNotifier::new(broadcaster, refresher)
    }

    #[tokio::test(start_paused = true)]
    async fn test_incident_then_refresh() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();
        let transport = RecordingTransport::new();
        registry.register(Connection::new(ConnectionId::new(), transport.clone()));

        notifier(&registry, &provider).notify_incident(IncidentEvent::new("INC0010001"));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            transport.kinds(),
            vec![UpdateKind::Incident, UpdateKind::Metrics]
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_goes_to_notification_subscribers() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();
        let transport = RecordingTransport::new();
        let id = ConnectionId::new();
        registry.register(Connection::new(id, transport.clone()));
        registry.unsubscribe(id, &[Topic::Overview]);
        registry.subscribe(id, &[Topic::Notification]);

        notifier(&registry, &provider).notify_delivery(DeliveryEvent {
            incident_number: "INC0010001".to_string(),
            channel: "sms".to_string(),
            success: false,
            error: Some("carrier rejected".to_string()),
            extra: Map::new(),
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // the follow-up refresh is a metrics update, which this viewer did not ask for
        assert_eq!(transport.kinds(), vec![UpdateKind::Notification]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_does_not_refresh() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();
        let transport = RecordingTransport::new();
        registry.register(Connection::new(ConnectionId::new(), transport.clone()));

        notifier(&registry, &provider).notify_activity(ActivityEvent {
            user: "jdoe".to_string(),
            action: "viewed".to_string(),
            extra: Map::new(),
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(transport.kinds(), vec![UpdateKind::Activity]);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_without_viewers_is_silent() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();

        notifier(&registry, &provider).notify_incident(IncidentEvent::new("INC0010002"));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(provider.calls(), 0);
    }
}
