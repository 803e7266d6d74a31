use serde::{Deserialize, Serialize};

/// Append-only audit row. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub resource_arn: String,
    pub kind: String,
    pub action: String,
    pub timestamp: i64,
    pub payload: serde_json::Value,
    pub correlation_id: String,
}
