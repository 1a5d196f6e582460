// Standard JSON envelope shared by every data endpoint

use serde::{Deserialize, Serialize};

/// `{success, timestamp, data, error}`; `timestamp` is milliseconds since the epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub timestamp: i64,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            timestamp: chrono::Utc::now().timestamp_millis(),
            data: None,
            error: Some(message.into()),
        }
    }
}
