//! Configuration resolved from an ordered stack of override layers.
//!
//! Each source (CLI flags, environment, JSON override files, the TOML config file)
//! produces a [`ConfigLayer`] with every field optional. [`resolve`] walks the layers
//! highest priority first and takes the first value it finds for each field, and for
//! each key of the map-valued fields.

use crate::error::{RelsyncError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHART_PATH: &str = "deploy/chart/Chart.yaml";
pub const DEFAULT_STATE_FILE: &str = ".submodule_update_state.json";
pub const DEFAULT_TAG_PATTERN: &str = "{version}";
pub const DEFAULT_REMOTE: &str = "origin";
pub const CONFIG_FILE_NAME: &str = "relsync.toml";
pub const CHART_OVERRIDES_FILE: &str = "chart-path-overrides.json";
pub const TAG_OVERRIDES_FILE: &str = "submodule-tag-overrides.json";

/// Tag override value meaning "whatever the newest tag is"
pub const LATEST_TAG: &str = "latest";

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Parent chart, relative to the repository root
    pub repo_chart: PathBuf,
    /// Chart path per submodule, relative to that submodule
    pub submodule_charts: IndexMap<String, PathBuf>,
    /// Tag to suggest per submodule instead of the newest one
    pub submodule_tags: IndexMap<String, String>,
    pub state_file: PathBuf,
    pub prerelease_identifier: Option<String>,
    pub tag_pattern: String,
    pub remote: String,
}

impl Config {
    /// Chart path for a submodule, relative to the submodule directory
    pub fn submodule_chart(&self, name: &str) -> PathBuf {
        self.submodule_charts
            .get(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_PATH))
    }

    /// Tag override for a submodule, if one was configured
    pub fn tag_override(&self, name: &str) -> Option<&str> {
        self.submodule_tags.get(name).map(String::as_str)
    }
}

impl Default for Config {
    fn default() -> Self {
        resolve(&[])
    }
}

/// One source of configuration values; unset fields defer to lower layers
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub repo_chart: Option<PathBuf>,
    pub submodule_charts: IndexMap<String, PathBuf>,
    pub submodule_tags: IndexMap<String, String>,
    pub state_file: Option<PathBuf>,
    pub prerelease_identifier: Option<String>,
    pub tag_pattern: Option<String>,
    pub remote: Option<String>,
}

/// Legacy `chart-path-overrides.json` layout
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChartPathOverrides {
    repo_chart: Option<PathBuf>,
    submodule_charts: IndexMap<String, PathBuf>,
}

/// Resolve layers, highest priority first, onto the built-in defaults
pub fn resolve(layers: &[ConfigLayer]) -> Config {
    fn first<T: Clone>(layers: &[ConfigLayer], field: impl Fn(&ConfigLayer) -> Option<&T>) -> Option<T> {
        layers.iter().find_map(|layer| field(layer).cloned())
    }

    fn merged<V: Clone>(
        layers: &[ConfigLayer],
        field: impl Fn(&ConfigLayer) -> &IndexMap<String, V>,
    ) -> IndexMap<String, V> {
        let mut out = IndexMap::new();
        for layer in layers {
            for (key, value) in field(layer) {
                out.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        out
    }

    Config {
        repo_chart: first(layers, |l| l.repo_chart.as_ref())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_PATH)),
        submodule_charts: merged(layers, |l| &l.submodule_charts),
        submodule_tags: merged(layers, |l| &l.submodule_tags),
        state_file: first(layers, |l| l.state_file.as_ref())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
        prerelease_identifier: first(layers, |l| l.prerelease_identifier.as_ref()),
        tag_pattern: first(layers, |l| l.tag_pattern.as_ref())
            .unwrap_or_else(|| DEFAULT_TAG_PATTERN.to_string()),
        remote: first(layers, |l| l.remote.as_ref())
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
    }
}

/// Layer from the process environment (`RELSYNC_*`)
pub fn env_layer() -> ConfigLayer {
    let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

    ConfigLayer {
        repo_chart: var("RELSYNC_REPO_CHART").map(PathBuf::from),
        state_file: var("RELSYNC_STATE_FILE").map(PathBuf::from),
        prerelease_identifier: var("RELSYNC_PRERELEASE_IDENTIFIER"),
        remote: var("RELSYNC_REMOTE"),
        ..ConfigLayer::default()
    }
}

/// Parse a JSON object argument such as `{"subA": "v1.2.0"}`. Empty input is an empty map.
pub fn parse_json_map<V>(raw: &str, what: &str) -> Result<IndexMap<String, V>>
where
    V: for<'de> Deserialize<'de>,
{
    if raw.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    serde_json::from_str(raw).map_err(|e| RelsyncError::config(format!("Invalid {} JSON: {}", what, e)))
}

/// Layer from the legacy JSON override files in `root`. Missing files contribute nothing.
pub fn override_files_layer(
    root: &Path,
    chart_overrides: Option<&Path>,
    tag_overrides: Option<&Path>,
) -> Result<ConfigLayer> {
    let chart_path = root.join(chart_overrides.unwrap_or(Path::new(CHART_OVERRIDES_FILE)));
    let tag_path = root.join(tag_overrides.unwrap_or(Path::new(TAG_OVERRIDES_FILE)));

    let charts: ChartPathOverrides = read_json_if_exists(&chart_path)?.unwrap_or_default();
    let tags: IndexMap<String, String> = read_json_if_exists(&tag_path)?.unwrap_or_default();

    Ok(ConfigLayer {
        repo_chart: charts.repo_chart,
        submodule_charts: charts.submodule_charts,
        submodule_tags: tags,
        ..ConfigLayer::default()
    })
}

fn read_json_if_exists<T>(path: &Path) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.is_file() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| RelsyncError::config(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Loads the TOML config file layer.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `relsync.toml` in the repository root
/// 3. `<config_dir>/relsync/relsync.toml` in the user config directory
/// 4. An empty layer if no file is found
///
/// # Returns
/// * `Ok(ConfigLayer)` - Loaded or empty layer
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config_file(root: &Path, config_path: Option<&Path>) -> Result<ConfigLayer> {
    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if root.join(CONFIG_FILE_NAME).exists() {
        root.join(CONFIG_FILE_NAME)
    } else if let Some(path) = dirs::config_dir()
        .map(|dir| dir.join("relsync").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
    {
        path
    } else {
        return Ok(ConfigLayer::default());
    };

    let raw = fs::read_to_string(&path)
        .map_err(|e| RelsyncError::config(format!("Cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&raw)
        .map_err(|e| RelsyncError::config(format!("Invalid config {}: {}", path.display(), e)))
}
