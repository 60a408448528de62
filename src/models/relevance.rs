use serde::{Deserialize, Serialize};

/// State of the backend's scheduled relevance scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelevanceStatus {
    pub is_enabled_override: bool,
    pub is_within_schedule: bool,
    pub effective_status: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Response of the backend's manual job processing trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProcessingResult {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub newest_job_datetime_processed_this_run: Option<String>,
    #[serde(default)]
    pub last_processed_datetime_for_next_run: Option<String>,
    #[serde(default)]
    pub batch_details: Option<Vec<serde_json::Value>>,
}
