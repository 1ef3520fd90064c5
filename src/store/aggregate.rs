use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rusqlite::params;
use std::collections::HashMap;

use super::IncidentStore;
use crate::dashboard::payloads::{
    HealthReport, HealthStatus, MetricsSnapshot, SummaryCounters, TrendPoint,
};
use crate::errors::StoreError;

const SECS_PER_HOUR: i64 = 3600;

/// Failure rate at or above which deliveries are considered degraded
pub const DEGRADED_FAILURE_RATE: f64 = 0.1;
/// Failure rate at or above which deliveries are considered broken
pub const UNHEALTHY_FAILURE_RATE: f64 = 0.5;

impl IncidentStore {
    /// Aggregate dashboard numbers as of `now`.
    ///
    /// The trend has exactly `trend_hours` hourly buckets ending with the
    /// bucket containing `now`; hours without incidents are zero.
    pub fn compute_snapshot(
        &self,
        trend_hours: u32,
        now: DateTime<Utc>,
    ) -> Result<MetricsSnapshot, StoreError> {
        let conn = self.conn.lock();
        let now_ts = now.timestamp();
        let window_start = now_ts - i64::from(trend_hours) * SECS_PER_HOUR;

        let incidents_total: i64 =
            conn.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
        let incidents_recent: i64 = conn.query_row(
            "SELECT COUNT(*) FROM incidents WHERE received_at >= ?1",
            params![window_start],
            |row| row.get(0),
        )?;
        let last_incident_ts: Option<i64> =
            conn.query_row("SELECT MAX(received_at) FROM incidents", [], |row| row.get(0))?;

        let (deliveries_succeeded, deliveries_failed): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(success = 1), 0), COALESCE(SUM(success = 0), 0) FROM deliveries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let (window_total, window_failed): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(success = 0), 0) FROM deliveries WHERE delivered_at >= ?1",
            params![window_start],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        // hourly buckets, oldest first
        let current_bucket = now_ts - now_ts.rem_euclid(SECS_PER_HOUR);
        let first_bucket = current_bucket - (i64::from(trend_hours) - 1) * SECS_PER_HOUR;

        let mut stmt = conn.prepare(
            "SELECT received_at - (received_at % 3600) AS bucket, COUNT(*)
             FROM incidents
             WHERE received_at >= ?1
             GROUP BY bucket",
        )?;
        let counts = stmt
            .query_map(params![first_bucket], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<HashMap<i64, i64>, _>>()?;

        let trends = (0..i64::from(trend_hours))
            .filter_map(|i| {
                let bucket = first_bucket + i * SECS_PER_HOUR;
                from_unix(bucket).map(|bucket_time| TrendPoint {
                    bucket: bucket_time,
                    incidents: counts.get(&bucket).copied().unwrap_or(0).max(0) as u64,
                })
            })
            .collect();

        let delivery_failure_rate = if window_total > 0 {
            window_failed as f64 / window_total as f64
        } else {
            0.0
        };

        let mut notes = Vec::new();
        let status = if delivery_failure_rate >= UNHEALTHY_FAILURE_RATE {
            notes.push(format!(
                "{:.0}% of deliveries failed in the last {}h",
                delivery_failure_rate * 100.0,
                trend_hours
            ));
            HealthStatus::Unhealthy
        } else if delivery_failure_rate >= DEGRADED_FAILURE_RATE {
            notes.push(format!(
                "{:.0}% of deliveries failed in the last {}h",
                delivery_failure_rate * 100.0,
                trend_hours
            ));
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let last_incident_at = last_incident_ts.and_then(from_unix);
        if let Some(last) = last_incident_at {
            if now - last > ChronoDuration::hours(i64::from(trend_hours)) {
                notes.push(format!("no incidents received in the last {}h", trend_hours));
            }
        }

        Ok(MetricsSnapshot {
            health: HealthReport {
                status,
                store_reachable: true,
                last_incident_at,
                delivery_failure_rate,
                notes,
            },
            summary: SummaryCounters {
                incidents_total: incidents_total.max(0) as u64,
                incidents_recent: incidents_recent.max(0) as u64,
                deliveries_succeeded: deliveries_succeeded.max(0) as u64,
                deliveries_failed: deliveries_failed.max(0) as u64,
            },
            trends,
            generated_at: now,
        })
    }
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
