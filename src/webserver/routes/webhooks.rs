/// Ingestion routes
///
/// Events are persisted first (on the blocking pool), then handed to the
/// dashboard notifier. The notifier never fails, so once the store write
/// succeeds the caller always gets `202`.
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

use crate::dashboard::payloads::{ActivityEvent, DeliveryEvent, IncidentEvent};
use crate::logger::{self, LogTag};
use crate::webserver::error::ApiError;
use crate::webserver::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhooks/incident", post(incident_webhook))
        .route("/webhooks/delivery", post(delivery_webhook))
        .route("/activity", post(activity))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request("INVALID_BODY", format!("invalid JSON body: {}", e)))
}

fn require(value: &str, code: &'static str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(code, format!("{} is required", field)));
    }
    Ok(())
}

/// POST /api/webhooks/incident
async fn incident_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let incident: IncidentEvent = parse_body(&body)?;
    require(&incident.number, "MISSING_NUMBER", "number")?;

    let record = incident.clone();
    let is_new = state
        .store
        .blocking(move |store| store.record_incident(&record))
        .await?;
    logger::info(
        LogTag::Webserver,
        &format!(
            "Incident webhook {} ({})",
            incident.number,
            if is_new { "new" } else { "update" }
        ),
    );

    let number = incident.number.clone();
    state.dashboard.notifier().notify_incident(incident);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "number": number })),
    )
        .into_response())
}

/// POST /api/webhooks/delivery
async fn delivery_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let delivery: DeliveryEvent = parse_body(&body)?;
    require(&delivery.incident_number, "MISSING_INCIDENT_NUMBER", "incident_number")?;
    require(&delivery.channel, "MISSING_CHANNEL", "channel")?;

    let record = delivery.clone();
    state
        .store
        .blocking(move |store| store.record_delivery(&record))
        .await?;
    if !delivery.success {
        logger::warning(
            LogTag::Webserver,
            &format!(
                "Delivery of {} to {} failed: {}",
                delivery.incident_number,
                delivery.channel,
                delivery.error.as_deref().unwrap_or("unknown error")
            ),
        );
    }

    let number = delivery.incident_number.clone();
    state.dashboard.notifier().notify_delivery(delivery);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "incident_number": number })),
    )
        .into_response())
}

/// POST /api/activity
async fn activity(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let activity: ActivityEvent = parse_body(&body)?;
    require(&activity.user, "MISSING_USER", "user")?;
    require(&activity.action, "MISSING_ACTION", "action")?;

    state.dashboard.notifier().notify_activity(activity);

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))).into_response())
}
