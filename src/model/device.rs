use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String, // FK → User.id
    pub api_key: String, // generated server-side, never re-derivable
    pub is_active: bool,
    pub last_seen_ts: Option<i64>,
    pub created_ts: i64,
}
