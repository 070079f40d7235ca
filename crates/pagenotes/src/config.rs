//! Configuration management for pagenotes.
//!
//! Configuration is loaded with figment from defaults, a TOML file, and
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "pagenotes";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "pages.db";

/// Default directory name for uploaded objects.
const OBJECTS_DIR_NAME: &str = "objects";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PAGENOTES_`, sections separated
///    by `__`, e.g. `PAGENOTES_EDITOR__AUTOSAVE_DELAY_MS`)
/// 2. TOML config file at `~/.config/pagenotes/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Editor configuration.
    pub editor: EditorConfig,
    /// Signed-in account.
    pub account: AccountConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the page database.
    /// Defaults to `~/.local/share/pagenotes/pages.db`
    pub database_path: Option<PathBuf>,
    /// Directory holding uploaded objects.
    /// Defaults to `~/.local/share/pagenotes/objects`
    pub objects_dir: Option<PathBuf>,
    /// Base URL under which uploaded objects are publicly reachable.
    /// Defaults to the `file://` URL of the objects directory.
    pub public_base_url: Option<String>,
}

/// Editor-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before a save is sent.
    pub autosave_delay_ms: u64,
    /// Title given to newly created pages.
    pub new_page_title: String,
    /// Largest image accepted for upload, in bytes.
    /// Set to 0 for unlimited.
    pub max_image_bytes: usize,
}

/// The account the local session signs in as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Owning user id for created pages and uploads.
    pub user_id: String,
    /// Email shown for the signed-in user.
    pub email: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 1000,
            new_page_title: crate::page::UNTITLED.to_string(),
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            email: "local@localhost".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PAGENOTES_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.editor.autosave_delay_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "autosave_delay_ms must be greater than 0".to_string(),
            });
        }

        if self.account.user_id.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "account user_id must not be empty".to_string(),
            });
        }

        // User ids become the first path segment of uploaded objects.
        if self.account.user_id.contains(['/', '\\']) || self.account.user_id == ".." {
            return Err(Error::ConfigValidation {
                message: format!(
                    "account user_id must be a single path segment: {}",
                    self.account.user_id
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the objects directory, resolving defaults if not set.
    #[must_use]
    pub fn objects_dir(&self) -> PathBuf {
        self.storage
            .objects_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(OBJECTS_DIR_NAME))
    }

    /// Get the public base URL for uploaded objects.
    #[must_use]
    pub fn public_base_url(&self) -> String {
        self.storage
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("file://{}", self.objects_dir().display()))
    }

    /// Get the autosave quiet period as a Duration.
    #[must_use]
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.editor.autosave_delay_ms)
    }

    /// Get the image size limit, if any.
    #[must_use]
    pub fn max_image_bytes(&self) -> Option<usize> {
        if self.editor.max_image_bytes == 0 {
            None
        } else {
            Some(self.editor.max_image_bytes)
        }
    }
}
