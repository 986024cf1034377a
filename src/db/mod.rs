use anyhow::Result;
use rocksdb::{Direction, IteratorMode, Options, DB};

use crate::model::{device::Device, log_record::LogRecord, user::User};

use std::str;

pub struct DbLayer {
    db: DB,
}

impl DbLayer {
    pub fn new(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    // ============================================================
    // KEY LAYOUT
    // ============================================================
    fn user_key(user_id: &str) -> String {
        format!("user:{user_id}")
    }

    fn email_lookup_key(email: &str) -> String {
        format!("user_email:{email}")
    }

    fn device_key(user_id: &str, device_id: &str) -> String {
        format!("user_device:{user_id}:{device_id}")
    }

    fn device_lookup_key(device_id: &str) -> String {
        format!("device_lookup:{device_id}")
    }

    fn log_key(user_id: &str, ts: i64, log_id: &str) -> String {
        // Flipping the sign bit maps i64 onto u64 order-preservingly, so
        // zero-padded keys sort correctly even for pre-1970 timestamps.
        let ordered = (ts as u64) ^ (1 << 63);
        format!("user_log:{user_id}:{ordered:020}:{log_id}")
    }

    fn log_prefix(user_id: &str) -> String {
        format!("user_log:{user_id}:")
    }

    // ============================================================
    // USER STORAGE
    // ============================================================
    pub async fn save_user(&self, user: &User) -> Result<()> {
        let val = serde_json::to_vec(user)?;
        self.db.put(Self::user_key(&user.id), val)?;
        self.db
            .put(Self::email_lookup_key(&user.email), user.id.as_bytes())?;
        Ok(())
    }

    pub async fn load_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self
            .db
            .get(Self::user_key(id))?
            .map(|v| serde_json::from_slice(&v))
            .transpose()?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.db.get(Self::email_lookup_key(email))? else {
            return Ok(None);
        };
        self.load_user(str::from_utf8(&id)?).await
    }

    // ============================================================
    // DEVICE STORAGE
    // ============================================================
    pub async fn save_device(&self, device: &Device) -> Result<()> {
        let val = serde_json::to_vec(device)?;
        self.db
            .put(Self::device_key(&device.user_id, &device.id), val)?;

        // fast lookup: device → owner, used by the token-less ingest path
        self.db
            .put(Self::device_lookup_key(&device.id), device.user_id.as_bytes())?;
        Ok(())
    }

    pub async fn load_device(&self, device_id: &str) -> Result<Option<Device>> {
        let Some(owner) = self.db.get(Self::device_lookup_key(device_id))? else {
            return Ok(None);
        };
        let key = Self::device_key(str::from_utf8(&owner)?, device_id);
        Ok(self
            .db
            .get(key)?
            .map(|v| serde_json::from_slice(&v))
            .transpose()?)
    }

    /// Resolve a device for ingestion. Both the id and the API key must
    /// match, and the device must still be active.
    pub async fn find_device_by_key(
        &self,
        device_id: &str,
        api_key: &str,
    ) -> Result<Option<Device>> {
        let device = self.load_device(device_id).await?;
        Ok(device.filter(|d| d.api_key == api_key && d.is_active))
    }

    pub async fn list_devices_for_user(&self, user_id: &str) -> Result<Vec<Device>> {
        let prefix = format!("user_device:{user_id}:");
        let mut out = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, val) = item?;
            let k = str::from_utf8(&key)?;
            if !k.starts_with(&prefix) {
                break;
            }
            out.push(serde_json::from_slice(&val)?);
        }
        Ok(out)
    }

    // ============================================================
    // LOG STORAGE (USER-SCOPED, TIMESTAMP-ORDERED)
    // ============================================================
    pub async fn save_log(&self, record: &LogRecord) -> Result<()> {
        let key = Self::log_key(&record.user_id, record.ts, &record.id);
        let val = serde_json::to_vec(record)?;
        self.db.put(key, val)?;
        Ok(())
    }

    /// All of a user's logs, oldest first (key order), optionally restricted
    /// to one device. Callers reverse for newest-first presentation.
    pub async fn list_logs_for_user(
        &self,
        user_id: &str,
        device_id: Option<&str>,
    ) -> Result<Vec<LogRecord>> {
        let prefix = Self::log_prefix(user_id);
        let mut results = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, val) = item?;
            let k = str::from_utf8(&key)?;
            if !k.starts_with(&prefix) {
                break;
            }

            let record: LogRecord = serde_json::from_slice(&val)?;
            if let Some(device_id) = device_id {
                if record.device_id != device_id {
                    continue;
                }
            }
            results.push(record);
        }

        Ok(results)
    }

    /// Look up one log by id inside the owner's keyspace, so a record can
    /// never be fetched by a user who does not own it.
    pub async fn find_log(&self, user_id: &str, log_id: &str) -> Result<Option<LogRecord>> {
        let prefix = Self::log_prefix(user_id);
        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, val) = item?;
            let k = str::from_utf8(&key)?;
            if !k.starts_with(&prefix) {
                break;
            }
            if k.ends_with(log_id) {
                let record: LogRecord = serde_json::from_slice(&val)?;
                if record.id == log_id {
                    return Ok(Some(record));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::DbLayer;
    use crate::model::{
        device::Device,
        log_record::{LogPayload, LogRecord},
        user::User,
    };
    use uuid::Uuid;

    fn open_temp_db() -> DbLayer {
        let path = std::env::temp_dir().join(format!("fleetlog-db-test-{}", Uuid::new_v4()));
        DbLayer::new(path.to_str().unwrap()).unwrap()
    }

    fn make_user(email: &str) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            username: "tester".into(),
            email: email.into(),
            password_hash: "x".into(),
            created_ts: chrono::Utc::now().timestamp(),
        }
    }

    fn make_device(user_id: &str, api_key: &str) -> Device {
        Device {
            id: Uuid::new_v4().to_string(),
            name: "laptop".into(),
            description: None,
            user_id: user_id.into(),
            api_key: api_key.into(),
            is_active: true,
            last_seen_ts: None,
            created_ts: chrono::Utc::now().timestamp(),
        }
    }

    fn make_log(user_id: &str, device_id: &str, ts: i64, text: &str) -> LogRecord {
        LogRecord {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.into(),
            user_id: user_id.into(),
            ts,
            payload: LogPayload::Inline {
                text: text.into(),
                window_title: None,
                system_info: None,
            },
        }
    }

    #[tokio::test]
    async fn finds_user_by_email() {
        let db = open_temp_db();
        let user = make_user("a@example.com");
        db.save_user(&user).await.unwrap();

        let found = db.find_user_by_email("a@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);
        assert!(db
            .find_user_by_email("b@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn device_lookup_requires_matching_key() {
        let db = open_temp_db();
        let user = make_user("a@example.com");
        db.save_user(&user).await.unwrap();

        let device = make_device(&user.id, "deadbeefdeadbeefdeadbeefdeadbeef");
        db.save_device(&device).await.unwrap();

        let ok = db
            .find_device_by_key(&device.id, &device.api_key)
            .await
            .unwrap();
        assert_eq!(ok.unwrap().id, device.id);

        let bad_key = db.find_device_by_key(&device.id, "wrong").await.unwrap();
        assert!(bad_key.is_none());

        let bad_id = db
            .find_device_by_key("no-such-device", &device.api_key)
            .await
            .unwrap();
        assert!(bad_id.is_none());
    }

    #[tokio::test]
    async fn inactive_device_is_rejected() {
        let db = open_temp_db();
        let mut device = make_device("u1", "key");
        device.is_active = false;
        db.save_device(&device).await.unwrap();

        let found = db.find_device_by_key(&device.id, "key").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn logs_come_back_in_timestamp_order() {
        let db = open_temp_db();
        for ts in [30, 10, 20] {
            db.save_log(&make_log("u1", "d1", ts, "payload")).await.unwrap();
        }

        let logs = db.list_logs_for_user("u1", None).await.unwrap();
        let stamps: Vec<i64> = logs.iter().map(|l| l.ts).collect();
        assert_eq!(stamps, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn pre_epoch_timestamps_sort_before_recent_ones() {
        let db = open_temp_db();
        for ts in [20, -5, -10] {
            db.save_log(&make_log("u1", "d1", ts, "payload")).await.unwrap();
        }

        let logs = db.list_logs_for_user("u1", None).await.unwrap();
        let stamps: Vec<i64> = logs.iter().map(|l| l.ts).collect();
        assert_eq!(stamps, vec![-10, -5, 20]);
    }

    #[tokio::test]
    async fn logs_are_isolated_per_user_and_filterable_by_device() {
        let db = open_temp_db();
        db.save_log(&make_log("u1", "d1", 1, "mine")).await.unwrap();
        db.save_log(&make_log("u1", "d2", 2, "mine too")).await.unwrap();
        db.save_log(&make_log("u2", "d3", 3, "not mine")).await.unwrap();

        let all = db.list_logs_for_user("u1", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|l| l.user_id == "u1"));

        let filtered = db.list_logs_for_user("u1", Some("d2")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].device_id, "d2");

        // guessing another user's device id yields nothing
        let cross = db.list_logs_for_user("u1", Some("d3")).await.unwrap();
        assert!(cross.is_empty());
    }

    #[tokio::test]
    async fn find_log_respects_ownership() {
        let db = open_temp_db();
        let record = make_log("u1", "d1", 5, "secret");
        db.save_log(&record).await.unwrap();

        let mine = db.find_log("u1", &record.id).await.unwrap();
        assert_eq!(mine.unwrap().id, record.id);

        let theirs = db.find_log("u2", &record.id).await.unwrap();
        assert!(theirs.is_none());
    }
}
