//! End-to-end flow through the public dashboard API using the channel
//! transport the WebSocket handler uses.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

use incident_relay::config::DashboardConfig;
use incident_relay::dashboard::{
    ChannelTransport, DashboardService, HealthReport, IncidentEvent, MetricsProvider,
    MetricsSnapshot, ServerMessage, SummaryCounters, Topic, Transport, Update, UpdateKind,
};
use incident_relay::errors::DashboardError;

#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl MetricsProvider for CountingProvider {
    async fn snapshot(&self) -> Result<MetricsSnapshot, DashboardError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        Ok(MetricsSnapshot {
            health: HealthReport::healthy(),
            summary: SummaryCounters {
                incidents_total: n,
                ..SummaryCounters::default()
            },
            trends: Vec::new(),
            generated_at: Utc::now(),
        })
    }
}

fn drain(rx: &mut Receiver<Arc<ServerMessage>>) -> Vec<(UpdateKind, String)> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let ServerMessage::Update { kind, event, .. } = frame.as_ref() {
            out.push((*kind, event.clone()));
        }
    }
    out
}

fn service() -> (Arc<DashboardService>, Arc<CountingProvider>) {
    let provider = Arc::new(CountingProvider::default());
    let service = DashboardService::new(DashboardConfig::default(), provider.clone());
    (service, provider)
}

#[tokio::test(start_paused = true)]
async fn viewer_lifecycle() {
    let (service, _provider) = service();
    service.start();

    let (transport, mut rx) = ChannelTransport::new(64);
    let id = service.connect(transport.clone()).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            (UpdateKind::Metrics, "snapshot".to_string()),
            (UpdateKind::Health, "snapshot".to_string()),
        ]
    );

    service
        .notifier()
        .notify_incident(IncidentEvent::new("INC0020001"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        drain(&mut rx),
        vec![
            (UpdateKind::Incident, "new".to_string()),
            (UpdateKind::Metrics, "triggered".to_string()),
        ]
    );

    // periodic refresh at t=10s
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(
        drain(&mut rx),
        vec![(UpdateKind::Metrics, "refresh".to_string())]
    );

    service.unsubscribe(id, &[Topic::Overview]);
    service.subscribe(id, &[Topic::Activity]);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(drain(&mut rx).is_empty());

    service.stop().await;
    assert!(transport.is_closed());
    assert_eq!(service.stats().total_connections, 0);
    assert!(!service.stats().active);
}

#[tokio::test(start_paused = true)]
async fn silent_viewer_is_evicted() {
    let (service, _provider) = service();
    service.start();

    let (quiet, _quiet_rx) = ChannelTransport::new(64);
    let (chatty, _chatty_rx) = ChannelTransport::new(64);
    service.connect(quiet.clone()).await;
    let chatty_id = service.connect(chatty.clone()).await;

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(10)).await;
        service.heartbeat(chatty_id);
    }

    // sweeps at 30s/60s/90s: quiet is 90s idle by the third one, chatty never
    // more than 10s
    assert!(quiet.is_closed());
    assert!(!chatty.is_closed());
    assert_eq!(service.stats().total_connections, 1);
    assert_eq!(service.metrics().connections_evicted, 1);

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn full_queue_does_not_block_others() {
    let (service, _provider) = service();

    let (stuck, _stuck_rx) = ChannelTransport::new(2);
    let (healthy, mut healthy_rx) = ChannelTransport::new(64);
    service.connect(stuck).await;
    service.connect(healthy).await;
    drain(&mut healthy_rx);

    for i in 0..5 {
        service
            .notifier()
            .notify_activity(incident_relay::dashboard::ActivityEvent {
                user: format!("user{}", i),
                action: "viewed".to_string(),
                extra: serde_json::Map::new(),
            });
    }

    assert_eq!(drain(&mut healthy_rx).len(), 5);
    assert!(service.metrics().messages_failed >= 5);
    assert_eq!(service.stats().total_connections, 2);
}

#[tokio::test]
async fn two_viewers_with_different_topics() {
    let (service, provider) = service();

    let (c1, mut c1_rx) = ChannelTransport::new(64);
    let (c2, mut c2_rx) = ChannelTransport::new(64);
    service.connect(c1.clone()).await;
    let c2_id = service.connect(c2.clone()).await;
    drain(&mut c1_rx);
    drain(&mut c2_rx);

    service.unsubscribe(c2_id, &[Topic::Overview]);
    service.subscribe(c2_id, &[Topic::Health]);

    let snapshot = provider.snapshot().await.unwrap();
    let outcome = service.broadcast(&Update::metrics("refresh", snapshot));
    assert_eq!(outcome.matched, 1);
    assert_eq!(
        drain(&mut c1_rx),
        vec![(UpdateKind::Metrics, "refresh".to_string())]
    );
    assert!(drain(&mut c2_rx).is_empty());

    let outcome = service.broadcast(&Update::health("refresh", HealthReport::healthy()));
    assert_eq!(outcome.matched, 2);
    assert_eq!(
        drain(&mut c1_rx),
        vec![(UpdateKind::Health, "refresh".to_string())]
    );
    assert_eq!(
        drain(&mut c2_rx),
        vec![(UpdateKind::Health, "refresh".to_string())]
    );

    let stats = service.stats();
    assert_eq!(stats.topic_subscribers["overview"], 1);
    assert_eq!(stats.topic_subscribers["health"], 1);
}
