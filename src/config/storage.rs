use std::env;
use std::path::PathBuf;

/// Object storage configuration.
///
/// The storage client is constructed from this once at startup and injected
/// through `AppState` — never a module-level lazily-initialized global.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
    pub base_url: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            base_dir: env::var("STORAGE_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage/uploads")),
            base_url: env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".to_string()),
        }
    }
}
