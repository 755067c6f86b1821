use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Runtime settings, all taken from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub log_filter: String,
    /// Variables that were unset and fell back to their defaults.
    pub defaulted: Vec<&'static str>,
}

impl Config {
    pub fn load() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut defaulted = Vec::new();
        let mut lookup = |key: &'static str| {
            let value = var(key);
            if value.is_none() {
                defaulted.push(key);
            }
            value
        };

        let data_dir = lookup("STICKYBOARD_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir(&var));
        let export_dir = lookup("STICKYBOARD_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_filter = lookup("STICKYBOARD_LOG").unwrap_or_else(|| "info".to_string());

        Config {
            data_dir,
            export_dir,
            log_filter,
            defaulted,
        }
    }

    /// Record which settings came from defaults. Call once logging is up.
    pub fn log_defaults(&self) {
        for key in &self.defaulted {
            debug!(key, "environment variable not set, using default");
        }
    }

    /// The file standing in for the browser's local storage.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("stickyboard.log")
    }
}

fn default_data_dir(var: &impl Fn(&str) -> Option<String>) -> PathBuf {
    let home = var("HOME")
        .or_else(|| var("USERPROFILE"))
        .unwrap_or_else(|| ".".to_string());
    PathBuf::from(home).join(".stickyboard")
}
