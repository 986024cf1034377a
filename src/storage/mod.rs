use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::{fs::File, io::AsyncWriteExt};

#[derive(Clone)]
pub struct StorageService {
    root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

impl StorageService {
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create upload dir at {}", root.display()))?;

        Ok(Self { root })
    }

    /// Persist uploaded bytes under an ingestion-time-prefixed name so
    /// repeated uploads of the same filename never collide.
    pub async fn save(&self, bytes: &[u8], original_name: &str) -> Result<StoredFile> {
        let filename = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(original_name)
        );
        let path = self.root.join(&filename);

        let mut file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create file {}", path.display()))?;

        file.write_all(bytes)
            .await
            .with_context(|| format!("Failed to write file {}", path.display()))?;

        Ok(StoredFile {
            filename,
            path,
            size: bytes.len() as u64,
        })
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file {}", path.display()))
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitize_filename, StorageService};
    use uuid::Uuid;

    async fn temp_storage() -> StorageService {
        let root = std::env::temp_dir().join(format!("fleetlog-storage-test-{}", Uuid::new_v4()));
        StorageService::new(&root).await.unwrap()
    }

    #[tokio::test]
    async fn saves_bytes_and_reads_them_back() {
        let storage = temp_storage().await;
        let stored = storage.save(b"boot sequence ok", "session.log").await.unwrap();

        assert_eq!(stored.size, 16);
        assert!(stored.filename.ends_with("-session.log"));

        let bytes = storage.read(&stored.path).await.unwrap();
        assert_eq!(bytes, b"boot sequence ok");
    }

    #[tokio::test]
    async fn same_name_twice_gets_distinct_paths() {
        let storage = temp_storage().await;
        let a = storage.save(b"one", "dup.log").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let b = storage.save(b"two", "dup.log").await.unwrap();
        assert_ne!(a.path, b.path);
    }

    #[test]
    fn filenames_cannot_escape_the_root() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename("report 1.txt"), "report_1.txt");
    }
}
