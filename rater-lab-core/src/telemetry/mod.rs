//! Telemetry Module
//!
//! Structured per-stage telemetry for validation runs. Each pipeline stage
//! emits one [`StageEvent`], logged through `tracing` and optionally echoed
//! as JSON for machine consumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stage event types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageEventType {
    /// Stage completed successfully
    StageCompleted,
    /// Stage failed
    StageFailed,
    /// Run completed and a summary was emitted
    RunCompleted,
}

/// One telemetry event per pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// Event ID
    pub event_id: Uuid,

    /// Event type
    pub event_type: StageEventType,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Run this event belongs to (for correlation)
    pub run_id: Uuid,

    /// Stage name (loader, aligner, agreement-engine, ...)
    pub stage: String,

    /// Event payload
    pub payload: serde_json::Value,

    /// Stage duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Emits stage telemetry for one run.
#[derive(Debug, Clone)]
pub struct StageTelemetry {
    run_id: Uuid,
    /// Whether to echo events as JSON at debug level
    echo_json: bool,
}

impl StageTelemetry {
    /// Create an emitter for one run.
    pub fn new(run_id: Uuid) -> Self {
        let echo_json = std::env::var("RATER_LAB_TELEMETRY_JSON")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Self { run_id, echo_json }
    }

    /// Create an emitter with explicit configuration.
    pub fn with_config(run_id: Uuid, echo_json: bool) -> Self {
        Self { run_id, echo_json }
    }

    /// Emit a completion event for a stage.
    pub fn stage_completed(&self, stage: &str, started: Instant, payload: serde_json::Value) {
        self.emit(StageEvent {
            event_id: Uuid::new_v4(),
            event_type: StageEventType::StageCompleted,
            timestamp: Utc::now(),
            run_id: self.run_id,
            stage: stage.to_string(),
            payload,
            duration_ms: Some(started.elapsed().as_millis() as u64),
        });
    }

    /// Emit a failure event for a stage.
    pub fn stage_failed(&self, stage: &str, started: Instant, error: &str) {
        self.emit(StageEvent {
            event_id: Uuid::new_v4(),
            event_type: StageEventType::StageFailed,
            timestamp: Utc::now(),
            run_id: self.run_id,
            stage: stage.to_string(),
            payload: serde_json::json!({ "error": error }),
            duration_ms: Some(started.elapsed().as_millis() as u64),
        });
    }

    /// Emit the end-of-run event.
    pub fn run_completed(&self, started: Instant, payload: serde_json::Value) {
        self.emit(StageEvent {
            event_id: Uuid::new_v4(),
            event_type: StageEventType::RunCompleted,
            timestamp: Utc::now(),
            run_id: self.run_id,
            stage: "pipeline".to_string(),
            payload,
            duration_ms: Some(started.elapsed().as_millis() as u64),
        });
    }

    fn emit(&self, event: StageEvent) {
        match event.event_type {
            StageEventType::StageFailed => {
                warn!(
                    run_id = %event.run_id,
                    stage = %event.stage,
                    duration_ms = ?event.duration_ms,
                    "stage failed"
                );
            }
            _ => {
                info!(
                    run_id = %event.run_id,
                    stage = %event.stage,
                    duration_ms = ?event.duration_ms,
                    "stage event"
                );
            }
        }

        if self.echo_json {
            if let Ok(json) = serde_json::to_string(&event) {
                debug!(telemetry = %json);
            }
        }
    }
}
