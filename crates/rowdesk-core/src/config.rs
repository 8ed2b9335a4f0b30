//! Configuration types for rowdesk.
//!
//! [`Config::load`] layers, lowest priority first: the embedded defaults, the
//! config file (`~/.config/rowdesk/config.toml` unless a path is given), and
//! `ROWDESK_*` environment variables (`ROWDESK_SERVER__READ_ONLY=false`).
//! [`Config::defaults`] returns the embedded defaults without touching the
//! filesystem or the environment (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[server]
bind      = "127.0.0.1:5000"
read_only = true

[store]
backend          = "json"
data_dir         = "sql_dump"
sqlite_dir       = "databases"
default_database = "ASTORBASE"
key_column       = "ID"

[backup]
source_dir = "databases"
files      = ["ASTORBASE.db"]
out_dir    = "backups"
label      = "rowdesk"

[imperial]
table          = "ASTORBASE__SetBolts.json"
length_columns = ["Diameter", "Length", "HeadHeight"]
text_filters   = ["Standard", "Material", "Name", "Type"]

[integrity]
child  = "SetBolts.BoltDefID"
parent = "BoltDefinition.ID"
"#;

const ENV_PREFIX: &str = "ROWDESK";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub imperial: ImperialConfig,
    #[serde(default)]
    pub integrity: IntegrityConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// When set, no write route is registered at all.
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

fn default_bind() -> String { "127.0.0.1:5000".to_string() }
fn default_read_only() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            read_only: default_read_only(),
        }
    }
}

/// Which store adapter serves table data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Directory of `<database>__<table>.json` snapshots.
    Json,
    /// Directory of `<database>.db` SQLite files.
    Sqlite,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_sqlite_dir")]
    pub sqlite_dir: PathBuf,
    #[serde(default = "default_database")]
    pub default_database: String,
    /// Column used by single-row deletes.
    #[serde(default = "default_key_column")]
    pub key_column: String,
}

fn default_backend() -> StoreBackend { StoreBackend::Json }
fn default_data_dir() -> PathBuf { PathBuf::from("sql_dump") }
fn default_sqlite_dir() -> PathBuf { PathBuf::from("databases") }
fn default_database() -> String { "ASTORBASE".to_string() }
fn default_key_column() -> String { "ID".to_string() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            sqlite_dir: default_sqlite_dir(),
            default_database: default_database(),
            key_column: default_key_column(),
        }
    }
}

/// `[backup]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_backup_files")]
    pub files: Vec<String>,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    /// Prefix of each timestamped backup folder.
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_source_dir() -> PathBuf { PathBuf::from("databases") }
fn default_backup_files() -> Vec<String> { vec!["ASTORBASE.db".to_string()] }
fn default_out_dir() -> PathBuf { PathBuf::from("backups") }
fn default_label() -> String { "rowdesk".to_string() }

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            files: default_backup_files(),
            out_dir: default_out_dir(),
            label: default_label(),
        }
    }
}

/// `[imperial]` section: one table whose length columns are stored in
/// millimetres and shown in inches.
#[derive(Debug, Clone, Deserialize)]
pub struct ImperialConfig {
    #[serde(default = "default_imperial_table")]
    pub table: String,
    #[serde(default = "default_length_columns")]
    pub length_columns: Vec<String>,
    /// Columns accepted as exact-match filters on the imperial view.
    #[serde(default = "default_text_filters")]
    pub text_filters: Vec<String>,
}

fn default_imperial_table() -> String { "ASTORBASE__SetBolts.json".to_string() }
fn default_length_columns() -> Vec<String> {
    ["Diameter", "Length", "HeadHeight"].map(String::from).to_vec()
}
fn default_text_filters() -> Vec<String> {
    ["Standard", "Material", "Name", "Type"].map(String::from).to_vec()
}

impl Default for ImperialConfig {
    fn default() -> Self {
        Self {
            table: default_imperial_table(),
            length_columns: default_length_columns(),
            text_filters: default_text_filters(),
        }
    }
}

/// `[integrity]` section, `Table.Column` references.
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrityConfig {
    #[serde(default = "default_child")]
    pub child: String,
    #[serde(default = "default_parent")]
    pub parent: String,
}

fn default_child() -> String { "SetBolts.BoltDefID".to_string() }
fn default_parent() -> String { "BoltDefinition.ID".to_string() }

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            child: default_child(),
            parent: default_parent(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load `path`, or `~/.config/rowdesk/config.toml` when `path` is `None`,
    /// layered on top of the built-in defaults and under `ROWDESK_*`
    /// environment variables. The default file is created with the defaults if
    /// it does not exist; an explicit `path` must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => {
                let path = config_path();
                if !path.exists() {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
                }
                (path, false)
            }
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Parse a TOML document layered over the defaults. No file or
    /// environment access.
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("rowdesk")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
