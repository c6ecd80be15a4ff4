use std::time::Duration;

use instance_reaper_core::contract::{
    normalize_event, InstanceObservation, ReapRequest, ResponseEnvelope, MAX_POLL_ATTEMPTS,
    POLL_FAILURE_THRESHOLD, RETRIES_EXCEEDED_MESSAGE,
};
use instance_reaper_core::lifecycle::{
    eligible_instance_ids, still_stopping_ids, unterminated_ids,
};
use serde_json::{json, Value};

use crate::adapters::ec2::InstanceApi;
use crate::adapters::waiter::Waiter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaperConfig {
    pub tag_key: String,
    pub wait: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    Validation(String),
    Api {
        stage: &'static str,
        message: String,
    },
    RetriesExceeded {
        stage: &'static str,
    },
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => f.write_str(message),
            Self::Api { stage, message } => write!(f, "{stage} failed: {message}"),
            Self::RetriesExceeded { .. } => f.write_str(RETRIES_EXCEEDED_MESSAGE),
        }
    }
}

impl std::error::Error for StageError {}

/// Runs the discover / stop / terminate sweep for one trigger event.
///
/// Stage failures never escape as errors; every outcome is reported through
/// the response envelope.
pub fn handle_reap_event(
    event: &Value,
    config: &ReaperConfig,
    api: &dyn InstanceApi,
    waiter: &dyn Waiter,
) -> ResponseEnvelope {
    log_reaper_info("event_received", json!({ "event": event }));

    match run_stages(event, config, api, waiter) {
        Ok(()) => ResponseEnvelope::success(),
        Err(error) => {
            log_reaper_error(
                "reap_failed",
                json!({
                    "error": error.to_string(),
                }),
            );
            ResponseEnvelope::failure(error.to_string())
        }
    }
}

fn run_stages(
    event: &Value,
    config: &ReaperConfig,
    api: &dyn InstanceApi,
    waiter: &dyn Waiter,
) -> Result<(), StageError> {
    let request =
        normalize_event(event).map_err(|error| StageError::Validation(error.message().to_string()))?;

    let instance_ids = discover_instances(&request, config, api)?;
    log_reaper_info(
        "instances_discovered",
        json!({
            "count": instance_ids.len(),
            "instance_ids": instance_ids,
        }),
    );

    if instance_ids.is_empty() {
        return Ok(());
    }

    stop_instances(&instance_ids, config, api, waiter)?;
    log_reaper_info("instances_stopped", json!({ "instance_ids": instance_ids }));

    terminate_instances(&instance_ids, config, api, waiter)?;
    log_reaper_info(
        "instances_terminated",
        json!({ "instance_ids": instance_ids }),
    );

    Ok(())
}

fn discover_instances(
    request: &ReapRequest,
    config: &ReaperConfig,
    api: &dyn InstanceApi,
) -> Result<Vec<String>, StageError> {
    let observations = api
        .describe_by_tags(&config.tag_key, request.tags.as_deref())
        .map_err(|message| StageError::Api {
            stage: "discovery",
            message,
        })?;

    Ok(eligible_instance_ids(&observations))
}

fn stop_instances(
    instance_ids: &[String],
    config: &ReaperConfig,
    api: &dyn InstanceApi,
    waiter: &dyn Waiter,
) -> Result<(), StageError> {
    let stopping = api
        .stop_instances(instance_ids)
        .map_err(|message| StageError::Api {
            stage: "stop",
            message,
        })?;

    waiter.wait(config.wait);
    poll_until_settled(&stopping, config, api, waiter, "stop", still_stopping_ids)
}

fn terminate_instances(
    instance_ids: &[String],
    config: &ReaperConfig,
    api: &dyn InstanceApi,
    waiter: &dyn Waiter,
) -> Result<(), StageError> {
    let terminating = api
        .terminate_instances(instance_ids)
        .map_err(|message| StageError::Api {
            stage: "terminate",
            message,
        })?;

    waiter.wait(config.wait);
    poll_until_settled(&terminating, config, api, waiter, "terminate", unterminated_ids)
}

/// Re-describes `ids` until none remain in flight, bounded by
/// `MAX_POLL_ATTEMPTS`, failing once the attempt counter reaches
/// `POLL_FAILURE_THRESHOLD` with instances still in flight.
fn poll_until_settled(
    ids: &[String],
    config: &ReaperConfig,
    api: &dyn InstanceApi,
    waiter: &dyn Waiter,
    stage: &'static str,
    remaining_in_flight: impl Fn(&[InstanceObservation]) -> Vec<String>,
) -> Result<(), StageError> {
    if ids.is_empty() {
        return Ok(());
    }

    for attempt in 0..MAX_POLL_ATTEMPTS {
        let observations = api
            .describe_by_ids(ids)
            .map_err(|message| StageError::Api { stage, message })?;

        let remaining = remaining_in_flight(&observations);
        if remaining.is_empty() {
            return Ok(());
        }

        if attempt >= POLL_FAILURE_THRESHOLD {
            return Err(StageError::RetriesExceeded { stage });
        }

        waiter.wait(config.wait);
    }

    Err(StageError::RetriesExceeded { stage })
}

fn log_reaper_info(event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": "reaper_handler",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_reaper_error(event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": "reaper_handler",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
