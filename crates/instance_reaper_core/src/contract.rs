use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_POLL_ATTEMPTS: usize = 6;
pub const POLL_FAILURE_THRESHOLD: usize = 3;
pub const DEFAULT_WAIT_SECS: u64 = 10;
pub const DEFAULT_TAG_KEY: &str = "SubSystem";

pub const SUCCESS_MESSAGE: &str = "Instance sweep completed";
pub const FAILURE_MESSAGE: &str = "Error running instance sweep";
pub const RETRIES_EXCEEDED_MESSAGE: &str = "Maximum number of retries exceeded";

/// One instance as observed by a describe call, already flattened out of the
/// provider's reservation nesting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceObservation {
    pub instance_id: String,
    pub state: String,
}

/// Normalized trigger event. `tags: None` means unfiltered discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReapRequest {
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    #[serde(rename = "responseData")]
    pub response_data: String,
}

impl ResponseEnvelope {
    pub fn success() -> Self {
        Self {
            success: true,
            status_code: 200,
            message: SUCCESS_MESSAGE.to_string(),
            response_data: String::new(),
        }
    }

    pub fn failure(error_text: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: 500,
            message: FAILURE_MESSAGE.to_string(),
            response_data: error_text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Normalizes a raw trigger payload into a [`ReapRequest`].
///
/// The `tags` key must be present; a payload without it is rejected rather
/// than defaulted. A JSON `null` requests unfiltered discovery.
pub fn normalize_event(event: &Value) -> Result<ReapRequest, ValidationError> {
    let Some(object) = event.as_object() else {
        return Err(ValidationError::new("Event payload must be a JSON object"));
    };

    let Some(tags) = object.get("tags") else {
        return Err(ValidationError::new("Event is missing the 'tags' key"));
    };

    match tags {
        Value::Null => Ok(ReapRequest { tags: None }),
        Value::Array(values) => {
            let mut tag_values = Vec::with_capacity(values.len());
            for value in values {
                let Some(text) = value.as_str() else {
                    return Err(ValidationError::new("Tag values must be strings"));
                };
                tag_values.push(text.to_string());
            }
            Ok(ReapRequest {
                tags: Some(tag_values),
            })
        }
        _ => Err(ValidationError::new(
            "The 'tags' key must be null or a list of strings",
        )),
    }
}
