use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use super::daily_summary_repository::DailySummaryRepository;
use super::sleep_log_repository::SleepLogRepository;
use crate::storage::traits::Connection;

/// Name of the file in the default data directory that points elsewhere
pub const REDIRECT_FILE_NAME: &str = ".sleep_tracker_redirect";

/// CsvConnection manages the data directory layout shared by all file-backed
/// repositories:
///
/// ```text
/// {base}/
/// └── {child_directory}/
///     ├── sleep_logs.yaml
///     └── daily_summaries.csv
/// ```
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    /// Serializes read-modify-write cycles on the data files
    write_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Create a new connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {:?}", base_path))?;
        }

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a connection for `default_directory`, following a redirect file
    /// placed there if one exists
    pub fn new_with_redirect<P: AsRef<Path>>(default_directory: P) -> Result<Self> {
        let default_directory = default_directory.as_ref();
        let redirect_file = default_directory.join(REDIRECT_FILE_NAME);

        let actual_directory = if redirect_file.exists() {
            match fs::read_to_string(&redirect_file) {
                Ok(redirected) => {
                    let redirected = PathBuf::from(redirected.trim());
                    info!("Following data directory redirect to {:?}", redirected);
                    redirected
                }
                Err(e) => {
                    warn!("Failed to read redirect file {:?}: {}. Using default.", redirect_file, e);
                    default_directory.to_path_buf()
                }
            }
        } else {
            default_directory.to_path_buf()
        };

        Self::new(actual_directory)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding one child's files
    pub fn get_child_directory(&self, child_id: &str) -> PathBuf {
        self.base_directory.join(Self::safe_directory_name(child_id))
    }

    /// Percent-encode a child id into a single path component. Distinct ids
    /// always map to distinct names; `.` is escaped too so that no id can
    /// name `.` or `..`, and the empty id becomes a lone `%`, which no
    /// encoding of a non-empty id can produce.
    pub fn safe_directory_name(child_id: &str) -> String {
        if child_id.is_empty() {
            return "%".to_string();
        }
        urlencoding::encode(child_id).replace('.', "%2E")
    }

    pub fn ensure_child_directory(&self, child_id: &str) -> Result<PathBuf> {
        let child_dir = self.get_child_directory(child_id);
        if !child_dir.exists() {
            fs::create_dir_all(&child_dir)
                .with_context(|| format!("Failed to create child directory {:?}", child_dir))?;
        }
        Ok(child_dir)
    }

    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}

impl Connection for CsvConnection {
    type SleepLogRepository = SleepLogRepository;
    type DailySummaryRepository = DailySummaryRepository;

    fn create_sleep_log_repository(&self) -> Self::SleepLogRepository {
        SleepLogRepository::new(self.clone())
    }

    fn create_daily_summary_repository(&self) -> Self::DailySummaryRepository {
        DailySummaryRepository::new(self.clone())
    }
}
