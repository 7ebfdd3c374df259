//! Configuration loader and validator for the lesson CSV export.
//!
//! Defaults < optional YAML file < environment variables.
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::csv_writer::{CsvOptions, LineEnding};
use crate::notion::retry::RetryPolicy;
use crate::notion::{NOTION_API_BASE, NOTION_VERSION};

pub const DEFAULT_STATUS_PROPERTY: &str = "Videó státusz";
pub const DEFAULT_STATUS_VALUE: &str = "✅ Kész";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("failed to read .env: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

/// Top-level configuration; every section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub notion: NotionSettings,
    pub export: ExportSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".into(),
        }
    }
}

/// Notion API access. `token` and `database_id` may be empty until checked
/// by [`Config::validate_credentials`].
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
    pub version: String,
    pub base_url: String,
    pub retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            database_id: String::new(),
            version: NOTION_VERSION.into(),
            base_url: NOTION_API_BASE.into(),
            retries: 3,
            retry_base_delay_ms: 300,
        }
    }
}

impl fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionSettings")
            .field("database_id", &self.database_id)
            .field("version", &self.version)
            .field("base_url", &self.base_url)
            .field("retries", &self.retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .finish_non_exhaustive()
    }
}

impl NotionSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.retry_base_delay_ms))
    }
}

/// Which records are exported and how the CSV is shaped and guarded.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    pub status_property: String,
    pub status_value: String,
    pub expand_relations: bool,
    pub require_key: bool,
    pub key: String,
    pub add_bom: bool,
    pub eol: LineEnding,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            status_property: DEFAULT_STATUS_PROPERTY.into(),
            status_value: DEFAULT_STATUS_VALUE.into(),
            expand_relations: false,
            require_key: false,
            key: String::new(),
            add_bom: true,
            eol: LineEnding::CrLf,
        }
    }
}

impl ExportSettings {
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            line_ending: self.eol,
            byte_order_mark: self.add_bom,
        }
    }

    /// Exact match against the configured key; always true when not enforced.
    /// An absent or empty supplied key never matches.
    pub fn key_matches(&self, supplied: Option<&str>) -> bool {
        if !self.require_key {
            return true;
        }
        matches!(supplied, Some(key) if !key.is_empty() && key == self.key)
    }
}

impl Config {
    /// Overlay values from an environment lookup (normally `std::env::var`).
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NOTION_TOKEN") {
            self.notion.token = v;
        }
        if let Some(v) = lookup("NOTION_DATABASE_ID") {
            self.notion.database_id = v;
        }
        if let Some(v) = lookup("NOTION_VERSION").filter(|v| !v.is_empty()) {
            self.notion.version = v;
        }
        if let Some(v) = lookup("NOTION_API_BASE").filter(|v| !v.is_empty()) {
            self.notion.base_url = v;
        }
        if let Some(v) = lookup("NOTION_RETRIES") {
            self.notion.retries = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("NOTION_RETRIES must be an integer, got {:?}", v)))?;
        }
        if let Some(v) = lookup("NOTION_RETRY_BASE_MS") {
            self.notion.retry_base_delay_ms = v.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("NOTION_RETRY_BASE_MS must be an integer, got {:?}", v))
            })?;
        }
        if let Some(v) = lookup("STATUS_PROP_NAME").filter(|v| !v.is_empty()) {
            self.export.status_property = v;
        }
        if let Some(v) = lookup("STATUS_VALUE").filter(|v| !v.is_empty()) {
            self.export.status_value = v;
        }
        if let Some(v) = lookup("CSV_REQUIRE_KEY") {
            self.export.require_key = v == "1";
        }
        if let Some(v) = lookup("CSV_KEY") {
            self.export.key = v;
        }
        if let Some(v) = lookup("EXPAND_RELATIONS") {
            self.export.expand_relations = v == "1";
        }
        if let Some(v) = lookup("CSV_ADD_BOM") {
            self.export.add_bom = v != "0";
        }
        if let Some(v) = lookup("CSV_EOL") {
            self.export.eol = LineEnding::parse_lenient(&v);
        }
        if let Some(v) = lookup("BIND_ADDR").filter(|v| !v.is_empty()) {
            self.server.bind = v;
        }
        Ok(self)
    }

    /// Checked per export, before any Notion call.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.notion.database_id.trim().is_empty() {
            return Err(ConfigError::Missing("NOTION_DATABASE_ID"));
        }
        if self.notion.token.trim().is_empty() {
            return Err(ConfigError::Missing("NOTION_TOKEN"));
        }
        Ok(())
    }
}

/// Load configuration from a YAML file (if given), then apply the process
/// environment on top.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let base = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    let cfg = base.with_env(|name| std::env::var(name).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Load `.env` from the working directory into the process environment.
/// A missing file is fine; an unreadable or malformed one is an error.
pub fn load_dotenv() -> Result<(), ConfigError> {
    dotenv_outcome(dotenvy::dotenv().map(|_| ()))
}

fn dotenv_outcome(result: dotenvy::Result<()>) -> Result<(), ConfigError> {
    match result {
        Err(err) if !err.not_found() => Err(ConfigError::Dotenv(err)),
        _ => Ok(()),
    }
}

/// Structural checks that hold regardless of credentials.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.bind.trim().is_empty() {
        return Err(ConfigError::Invalid("server.bind must be non-empty".into()));
    }
    if cfg.notion.version.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.version must be non-empty".into()));
    }
    if cfg.export.status_property.trim().is_empty() {
        return Err(ConfigError::Invalid("export.status_property must be non-empty".into()));
    }
    Ok(())
}

/// Example YAML configuration.
pub fn example() -> &'static str {
    r#"server:
  bind: "0.0.0.0:3000"

notion:
  token: "YOUR_NOTION_INTEGRATION_TOKEN"
  database_id: "NOTION_LESSONS_DATABASE_ID"
  version: "2022-06-28"
  base_url: "https://api.notion.com/"
  retries: 3
  retry_base_delay_ms: 300

export:
  status_property: "Videó státusz"
  status_value: "✅ Kész"
  expand_relations: true
  require_key: true
  key: "CHANGE_ME"
  add_bom: true
  eol: "CRLF"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        cfg.validate_credentials().unwrap();
        assert_eq!(cfg.export.eol, LineEnding::CrLf);
        assert!(cfg.export.expand_relations);
    }

    #[test]
    fn defaults_match_import_conventions() {
        let cfg = Config::default();
        assert_eq!(cfg.export.status_property, "Videó státusz");
        assert_eq!(cfg.export.status_value, "✅ Kész");
        assert!(cfg.export.add_bom);
        assert_eq!(cfg.export.eol, LineEnding::CrLf);
        assert!(!cfg.export.require_key);
        assert!(!cfg.export.expand_relations);
        assert_eq!(cfg.notion.retries, 3);
        assert_eq!(cfg.notion.retry_base_delay_ms, 300);
    }

    #[test]
    fn env_overrides() {
        let cfg = Config::default()
            .with_env(env(&[
                ("NOTION_TOKEN", "tok"),
                ("NOTION_DATABASE_ID", "db"),
                ("STATUS_PROP_NAME", ""),
                ("STATUS_VALUE", "Kész"),
                ("CSV_REQUIRE_KEY", "1"),
                ("CSV_KEY", "s3cret"),
                ("EXPAND_RELATIONS", "1"),
                ("CSV_ADD_BOM", "0"),
                ("CSV_EOL", "lf"),
                ("NOTION_RETRIES", "5"),
            ]))
            .unwrap();
        assert_eq!(cfg.notion.token, "tok");
        assert_eq!(cfg.notion.database_id, "db");
        assert_eq!(cfg.export.status_property, DEFAULT_STATUS_PROPERTY);
        assert_eq!(cfg.export.status_value, "Kész");
        assert!(cfg.export.require_key);
        assert_eq!(cfg.export.key, "s3cret");
        assert!(cfg.export.expand_relations);
        assert!(!cfg.export.add_bom);
        assert_eq!(cfg.export.eol, LineEnding::Lf);
        assert_eq!(cfg.notion.retries, 5);
    }

    #[test]
    fn flags_only_enable_on_exact_values() {
        let cfg = Config::default()
            .with_env(env(&[
                ("CSV_REQUIRE_KEY", "true"),
                ("EXPAND_RELATIONS", "yes"),
                ("CSV_ADD_BOM", "false"),
            ]))
            .unwrap();
        assert!(!cfg.export.require_key);
        assert!(!cfg.export.expand_relations);
        assert!(cfg.export.add_bom);
    }

    #[test]
    fn invalid_retry_count() {
        let err = Config::default()
            .with_env(env(&[("NOTION_RETRIES", "many")]))
            .unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("NOTION_RETRIES")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn missing_credentials() {
        let cfg = Config::default();
        let err = cfg.validate_credentials().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("NOTION_DATABASE_ID")));
        assert_eq!(err.to_string(), "NOTION_DATABASE_ID is not set");

        let cfg = Config::default()
            .with_env(env(&[("NOTION_DATABASE_ID", "db")]))
            .unwrap();
        assert!(matches!(
            cfg.validate_credentials(),
            Err(ConfigError::Missing("NOTION_TOKEN"))
        ));
    }

    #[test]
    fn key_gate() {
        let mut export = ExportSettings::default();
        assert!(export.key_matches(None));
        export.require_key = true;
        export.key = "abc".into();
        assert!(export.key_matches(Some("abc")));
        assert!(!export.key_matches(Some("abc ")));
        assert!(!export.key_matches(Some("")));
        assert!(!export.key_matches(None));
        export.key = String::new();
        assert!(!export.key_matches(Some("")));
    }

    #[test]
    fn debug_hides_token() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        assert!(!format!("{:?}", cfg).contains("YOUR_NOTION_INTEGRATION_TOKEN"));
    }

    #[test]
    fn dotenv_missing_is_ok_but_malformed_fails() {
        let td = tempdir().unwrap();
        assert!(dotenv_outcome(dotenvy::from_path(td.path().join("absent.env"))).is_ok());

        let p = td.path().join("broken.env");
        fs::write(&p, "NOT A VALID LINE\n").unwrap();
        let err = dotenv_outcome(dotenvy::from_path(&p)).unwrap_err();
        assert!(matches!(err, ConfigError::Dotenv(_)));
        assert!(err.to_string().starts_with("failed to read .env"));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, "export:\n  status_value: \"Done\"\n").unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.export.status_value, "Done");
        assert_eq!(cfg.export.status_property, DEFAULT_STATUS_PROPERTY);
        assert_eq!(cfg.notion.version, NOTION_VERSION);
    }
}
