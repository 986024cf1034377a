use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::api::auth::AuthenticatedUser;
use crate::api::types::*;
use crate::auth::utils::generate_api_key;
use crate::error::{server_error, ApiError};
use crate::model::device::Device;
use crate::model::log_record::{LogPayload, LogRecord};
use crate::state::AppState;

// ------------------------------------------------------------
// DEVICES
// ------------------------------------------------------------

pub async fn register_device(
    State(state): State<AppState>,
    AuthenticatedUser { user_id }: AuthenticatedUser,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceCreated>), ApiError> {
    let device = Device {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        user_id,
        api_key: generate_api_key(),
        is_active: true,
        last_seen_ts: None,
        created_ts: chrono::Utc::now().timestamp(),
    };

    state.db.save_device(&device).await.map_err(server_error)?;

    // The key is included here and nowhere else; callers must capture it.
    Ok((StatusCode::CREATED, Json(device.into())))
}

pub async fn list_devices(
    State(state): State<AppState>,
    AuthenticatedUser { user_id }: AuthenticatedUser,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    let devices = state
        .db
        .list_devices_for_user(&user_id)
        .await
        .map_err(server_error)?;

    Ok(Json(devices.into_iter().map(DeviceView::from).collect()))
}

// ------------------------------------------------------------
// INGESTION (device API key, no user token)
// ------------------------------------------------------------

fn unauthorized() -> ApiError {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

pub async fn upload_log(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut api_key: Option<String> = None;
    let mut device_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid multipart payload: {e}"),
        )
    })? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("apiKey") => {
                api_key = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read field: {e}"))
                })?);
            }
            Some("deviceId") => {
                device_id = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read field: {e}"))
                })?);
            }
            Some("logfile") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read field: {e}"))
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let api_key = api_key.ok_or((StatusCode::BAD_REQUEST, "Missing apiKey".to_string()))?;
    let device_id =
        device_id.ok_or((StatusCode::BAD_REQUEST, "Missing deviceId".to_string()))?;
    let (filename, bytes) =
        file.ok_or((StatusCode::BAD_REQUEST, "Missing logfile".to_string()))?;

    let device = state
        .db
        .find_device_by_key(&device_id, &api_key)
        .await
        .map_err(server_error)?
        .ok_or_else(unauthorized)?;

    // File first, record second: a crash in between orphans a file but never
    // produces a record pointing at nothing.
    let stored = state
        .storage
        .save(&bytes, &filename)
        .await
        .map_err(server_error)?;

    let record = LogRecord {
        id: Uuid::new_v4().to_string(),
        device_id: device.id.clone(),
        user_id: device.user_id.clone(),
        ts: chrono::Utc::now().timestamp(),
        payload: LogPayload::File {
            filename: stored.filename,
            path: stored.path.to_string_lossy().into_owned(),
            size: stored.size,
        },
    };

    state.db.save_log(&record).await.map_err(server_error)?;
    touch_device(&state, device).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Log file uploaded successfully" })),
    ))
}

pub async fn submit_log_data(
    State(state): State<AppState>,
    Json(req): Json<InlineLogRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let device = state
        .db
        .find_device_by_key(&req.device_id, &req.api_key)
        .await
        .map_err(server_error)?
        .ok_or_else(unauthorized)?;

    let record = LogRecord {
        id: Uuid::new_v4().to_string(),
        device_id: device.id.clone(),
        user_id: device.user_id.clone(),
        ts: req
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp()),
        payload: LogPayload::Inline {
            text: req.log_data,
            window_title: req.window_title,
            system_info: req.system_info,
        },
    };

    state.db.save_log(&record).await.map_err(server_error)?;
    touch_device(&state, device).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Log data received successfully" })),
    ))
}

/// Refresh the device's last-seen stamp after a successful ingestion. Purely
/// advisory, so a store failure here does not fail the request.
async fn touch_device(state: &AppState, mut device: Device) {
    device.last_seen_ts = Some(chrono::Utc::now().timestamp());
    if let Err(err) = state.db.save_device(&device).await {
        tracing::warn!(device_id = %device.id, error = %err, "failed to update last_seen");
    }
}

// ------------------------------------------------------------
// QUERIES
// ------------------------------------------------------------

pub async fn list_logs(
    State(state): State<AppState>,
    AuthenticatedUser { user_id }: AuthenticatedUser,
    Query(query): Query<LogListQuery>,
) -> Result<Json<LogListResponse>, ApiError> {
    let mut records = state
        .db
        .list_logs_for_user(&user_id, query.device_id.as_deref())
        .await
        .map_err(server_error)?;

    let total = records.len();
    records.reverse(); // newest first

    let names = device_names(&state, &user_id).await?;

    let logs = records
        .into_iter()
        .skip(query.skip)
        .take(query.limit)
        .map(|record| {
            let name = names.get(&record.device_id).cloned();
            LogRecordView::from_record(record, name)
        })
        .collect();

    Ok(Json(LogListResponse { logs, total }))
}

pub async fn get_log(
    State(state): State<AppState>,
    AuthenticatedUser { user_id }: AuthenticatedUser,
    Path(log_id): Path<String>,
) -> Result<Json<LogRecordView>, ApiError> {
    let record = state
        .db
        .find_log(&user_id, &log_id)
        .await
        .map_err(server_error)?
        .ok_or((StatusCode::NOT_FOUND, "Log not found".to_string()))?;

    let device_name = state
        .db
        .load_device(&record.device_id)
        .await
        .map_err(server_error)?
        .map(|d| d.name);

    let file_path = match &record.payload {
        LogPayload::File { path, .. } => Some(path.clone()),
        LogPayload::Inline { .. } => None,
    };

    let mut view = LogRecordView::from_record(record, device_name);

    // Presentation-only merge of the two payload shapes: file contents are
    // substituted into the inline field. `log_data` is a text field, so
    // non-UTF-8 bytes are decoded with replacement characters. A missing
    // file is reported as an empty payload rather than an error, matching
    // list behavior.
    if let Some(path) = file_path {
        match state.storage.read(&path).await {
            Ok(bytes) => view.log_data = Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                tracing::warn!(log_id = %view.id, error = %err, "stored file unreadable");
            }
        }
    }

    Ok(Json(view))
}

async fn device_names(
    state: &AppState,
    user_id: &str,
) -> Result<HashMap<String, String>, ApiError> {
    let devices = state
        .db
        .list_devices_for_user(user_id)
        .await
        .map_err(server_error)?;
    Ok(devices.into_iter().map(|d| (d.id, d.name)).collect())
}
