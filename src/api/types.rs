use serde::{Deserialize, Serialize};

use crate::model::device::Device;
use crate::model::log_record::{LogPayload, LogRecord};

#[derive(Deserialize)]
pub struct RegisterDeviceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Returned once, at registration. This is the only response that carries
/// the API key.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCreated {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub api_key: String,
    pub is_active: bool,
    pub created_ts: i64,
}

impl From<Device> for DeviceCreated {
    fn from(d: Device) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            api_key: d.api_key,
            is_active: d.is_active,
            created_ts: d.created_ts,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub last_seen_ts: Option<i64>,
    pub created_ts: i64,
}

impl From<Device> for DeviceView {
    fn from(d: Device) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            is_active: d.is_active,
            last_seen_ts: d.last_seen_ts,
            created_ts: d.created_ts,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineLogRequest {
    pub api_key: String,
    pub device_id: String,
    pub log_data: String,
    #[serde(default)]
    pub window_title: Option<String>,
    #[serde(default)]
    pub system_info: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListQuery {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub skip: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListResponse {
    pub logs: Vec<LogRecordView>,
    pub total: usize,
}

/// Presentation shape for a log record. File-backed and inline records share
/// it; `get_log` hydrates file contents into `log_data` at the boundary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecordView {
    pub id: String,
    pub device_id: String,
    pub device_name: Option<String>,
    pub timestamp: i64,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<serde_json::Value>,
}

impl LogRecordView {
    pub fn from_record(record: LogRecord, device_name: Option<String>) -> Self {
        let (kind, filename, size, log_data, window_title, system_info) = match record.payload {
            LogPayload::File {
                filename, size, ..
            } => ("file", Some(filename), Some(size), None, None, None),
            LogPayload::Inline {
                text,
                window_title,
                system_info,
            } => ("inline", None, None, Some(text), window_title, system_info),
        };

        Self {
            id: record.id,
            device_id: record.device_id,
            device_name,
            timestamp: record.ts,
            kind,
            filename,
            size,
            log_data,
            window_title,
            system_info,
        }
    }
}
