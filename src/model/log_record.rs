use serde::{Deserialize, Serialize};

/// A single submitted log entry. The payload is a tagged variant so a record
/// is always exactly one of file-backed or inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub device_id: String, // FK → Device.id
    pub user_id: String,   // denormalized from the owning device at write time
    pub ts: i64,
    pub payload: LogPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogPayload {
    /// Bytes live on disk under the upload directory; the record only
    /// references them.
    File {
        filename: String,
        path: String,
        size: u64,
    },
    /// Payload stored directly in the document store.
    Inline {
        text: String,
        window_title: Option<String>,
        system_info: Option<serde_json::Value>,
    },
}
