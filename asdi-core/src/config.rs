//! Configuration file management for asdi-decode.
//!
//! Reads/writes `~/.asdi-decode/config.yaml` with the feed date
//! disambiguator, navigation data path, and airport prefix.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};

use crate::route::DEFAULT_AIRPORT_PREFIX;
use crate::types::AsdiError;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feed: FeedConfig,
    pub navdata: NavDataConfig,
    pub route: RouteConfig,
}

/// Year and month applied to feed timestamps, which carry only day and time.
/// `None` means the current UTC month.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavDataConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    pub airport_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed: FeedConfig {
                year: None,
                month: None,
            },
            navdata: NavDataConfig { path: None },
            route: RouteConfig {
                airport_prefix: DEFAULT_AIRPORT_PREFIX.into(),
            },
        }
    }
}

impl FeedConfig {
    /// Configured year/month, falling back to the current UTC date.
    pub fn year_month(&self) -> (i32, u32) {
        let now = Utc::now();
        (
            self.year.unwrap_or_else(|| now.year()),
            self.month.unwrap_or_else(|| now.month()),
        )
    }
}

/// Get the config directory path (`~/.asdi-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".asdi-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.asdi-decode/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, defaulting on any read failure.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(_) => Config::default(),
    }
}

/// Save config to `~/.asdi-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, AsdiError> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), AsdiError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| AsdiError::Config(e.to_string()))?;
    }
    std::fs::write(path, serialize_config(config)).map_err(|e| AsdiError::Config(e.to_string()))
}

/// Parse simple YAML-like config text. Unknown keys are ignored.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        match (current_section.as_deref(), key) {
            (Some("feed"), "year") => config.feed.year = parse_null_or(val),
            (Some("feed"), "month") => {
                config.feed.month = parse_null_or(val).filter(|m| (1..=12).contains(m))
            }
            (Some("navdata"), "path") => config.navdata.path = parse_string_value(val),
            (Some("route"), "airport_prefix") => {
                if let Some(v) = parse_string_value(val) {
                    config.route.airport_prefix = v;
                }
            }
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_null_or<T: std::str::FromStr>(val: &str) -> Option<T> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    fn opt<T: std::fmt::Display>(v: &Option<T>) -> String {
        v.as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "null".into())
    }

    let mut lines = vec!["# asdi-decode configuration".to_string(), String::new()];

    lines.push("feed:".into());
    lines.push(format!("  year: {}", opt(&config.feed.year)));
    lines.push(format!("  month: {}", opt(&config.feed.month)));
    lines.push(String::new());

    lines.push("navdata:".into());
    match &config.navdata.path {
        Some(p) => lines.push(format!("  path: \"{p}\"")),
        None => lines.push("  path: null".into()),
    }
    lines.push(String::new());

    lines.push("route:".into());
    lines.push(format!(
        "  airport_prefix: \"{}\"",
        config.route.airport_prefix
    ));

    lines.join("\n") + "\n"
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&serialize_config(self))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
