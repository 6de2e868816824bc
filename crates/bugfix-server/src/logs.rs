use std::path::{Path, PathBuf};

/// Uploaded log storage: one file per upload, named by upload time.
///
/// Names have millisecond resolution and are the only uniqueness guarantee;
/// two uploads in the same millisecond write the same file and the later
/// one wins.
#[derive(Debug, Clone)]
pub struct LogStore {
    root: PathBuf,
    dir: PathBuf,
}

impl LogStore {
    /// `dir` is resolved against `root` unless absolute.
    pub fn new(root: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dir: dir.into(),
        }
    }

    /// Path handed to clients and the agent, e.g. `./logs/session-1700000000000.log`.
    pub fn log_path(&self, millis: i64) -> String {
        Path::new(".")
            .join(&self.dir)
            .join(format!("session-{millis}.log"))
            .to_string_lossy()
            .into_owned()
    }

    /// Where `log_path` lives on disk.
    pub fn resolve(&self, log_path: &str) -> PathBuf {
        self.root.join(log_path)
    }

    /// Store `text` under the current timestamp.
    pub async fn write(&self, text: &str) -> std::io::Result<String> {
        self.write_at(chrono::Utc::now().timestamp_millis(), text)
            .await
    }

    /// Store `text` under an explicit timestamp, creating the directory if
    /// needed and overwriting any earlier upload with the same name.
    pub async fn write_at(&self, millis: i64, text: &str) -> std::io::Result<String> {
        tokio::fs::create_dir_all(self.root.join(&self.dir)).await?;
        let log_path = self.log_path(millis);
        tokio::fs::write(self.resolve(&log_path), text).await?;
        tracing::debug!(%log_path, bytes = text.len(), "stored uploaded log");
        Ok(log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_path_is_relative_to_workspace() {
        let store = LogStore::new("/srv/ws", "logs");
        assert_eq!(store.log_path(42), "./logs/session-42.log");
        assert_eq!(
            store.resolve("./logs/session-42.log"),
            PathBuf::from("/srv/ws/./logs/session-42.log")
        );
    }

    #[tokio::test]
    async fn write_creates_directory_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "logs");
        let text = "ERROR at ProjectA -> ProjectB\n\tat handler()\n";
        let log_path = store.write(text).await.unwrap();

        assert!(log_path.starts_with("./logs/session-"));
        let on_disk = std::fs::read_to_string(store.resolve(&log_path)).unwrap();
        assert_eq!(on_disk, text);
    }

    #[tokio::test]
    async fn same_timestamp_overwrites_earlier_upload() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "logs");
        let first = store.write_at(1_700_000_000_000, "first upload").await.unwrap();
        let second = store.write_at(1_700_000_000_000, "second upload").await.unwrap();

        assert_eq!(first, second);
        let on_disk = std::fs::read_to_string(store.resolve(&second)).unwrap();
        assert_eq!(on_disk, "second upload");
    }

    #[tokio::test]
    async fn nested_log_dir_is_created() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path(), "var/uploads");
        let log_path = store.write_at(7, "x").await.unwrap();
        assert_eq!(log_path, "./var/uploads/session-7.log");
        assert!(dir.path().join("var/uploads/session-7.log").is_file());
    }
}
