use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const CONFIG_FILE: &str = "cutover.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Directory(PathBuf),
    Remote(Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data: DataLocation,
    pub clear_points_on_controller_change: bool,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data: DataLocation::Directory(PathBuf::from("./data")),
            clear_points_on_controller_change: false,
            request_timeout_seconds: 10,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    data_url: Option<String>,
    clear_points_on_controller_change: Option<bool>,
    request_timeout_seconds: Option<u64>,
}

/// Defaults, then `path` if it exists, then the environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok())?;

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileConfig = toml::from_str(raw)?;

    if let Some(dir) = file_cfg.data_dir {
        settings.data = DataLocation::Directory(dir);
    }
    if let Some(url) = file_cfg.data_url {
        settings.data = DataLocation::Remote(parse_data_url(&url)?);
    }
    if let Some(v) = file_cfg.clear_points_on_controller_change {
        settings.clear_points_on_controller_change = v;
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        if v == 0 {
            bail!("request_timeout_seconds must be at least 1");
        }
        settings.request_timeout_seconds = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    for key in ["CUTOVER_DATA_DIR", "APP__DATA_DIR"] {
        if let Some(v) = lookup(key) {
            settings.data = DataLocation::Directory(PathBuf::from(v));
        }
    }
    for key in ["CUTOVER_DATA_URL", "APP__DATA_URL"] {
        if let Some(v) = lookup(key) {
            settings.data = DataLocation::Remote(
                parse_data_url(&v).with_context(|| format!("invalid {key}"))?,
            );
        }
    }

    if let Some(v) = lookup("APP__CLEAR_POINTS_ON_CONTROLLER_CHANGE") {
        if let Some(parsed) = parse_flag(&v) {
            settings.clear_points_on_controller_change = parsed;
        }
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed @ 1..) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
    Ok(())
}

pub fn parse_data_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("'{raw}' is not a valid url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("data url '{url}' must use http or https");
    }
    Ok(url)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
