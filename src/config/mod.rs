/// Configuration system for lms-console.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::ConsoleConfig::default()`]
/// 2. **User global config**: `~/.lms-console/config.toml`
/// 3. **Project local config**: `.lms-console.toml` in the current directory
/// 4. **Environment variables**: `LMS_CONSOLE_*` overrides (highest precedence)
///
/// Later layers override earlier ones key by key. Missing sections in a TOML
/// file keep the previous layer's values.
///
/// # Usage
///
/// ```rust,ignore
/// use lms_console::config;
///
/// let cfg = config::load();
/// let client = ApiClient::new(&cfg.server, session, activity);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::ConsoleConfig;

use schema::MIN_REFRESH_INTERVAL_MS;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> ConsoleConfig {
    let mut merged = match toml::Value::try_from(ConsoleConfig::default()) {
        Ok(value) => value,
        Err(_) => return with_env_overrides(ConsoleConfig::default()),
    };

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = load_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }

    let config = merged.try_into().unwrap_or_default();
    with_env_overrides(config)
}

/// Read a TOML file as a raw value tree.
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. Malformed files are ignored so a broken config never
/// locks the operator out of the console.
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // A layer that would not deserialize on its own is dropped entirely.
    value.clone().try_into::<ConsoleConfig>().ok()?;
    Some(value)
}

/// Overlay `layer` onto `base`, recursing into tables.
///
/// Only keys present in `layer` are replaced, so a file that sets one key
/// leaves the rest of its section at the previous layer's values.
fn merge_values(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base_table), toml::Value::Table(layer_table)) => {
            for (key, value) in layer_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// The console's state directory: `~/.lms-console/`.
///
/// Holds the config file, the session file and the activity log.
pub fn console_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lms-console"))
}

/// Path to the user global config: `~/.lms-console/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    console_home().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config: `.lms-console.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".lms-console.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `LMS_CONSOLE_URL`: backend base URL
/// - `LMS_CONSOLE_TIMEOUT_MS`: per-request timeout
/// - `LMS_CONSOLE_REFRESH_MS`: dashboard poll period
/// - `LMS_CONSOLE_ACTIVITY_LOG`: activity log on/off (`1`/`true`/`yes`/`on`)
fn with_env_overrides(mut config: ConsoleConfig) -> ConsoleConfig {
    if let Ok(val) = std::env::var("LMS_CONSOLE_URL")
        && !val.is_empty()
    {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("LMS_CONSOLE_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("LMS_CONSOLE_REFRESH_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.dashboard.refresh_interval_ms = ms;
    }
    if let Ok(val) = std::env::var("LMS_CONSOLE_ACTIVITY_LOG") {
        config.logging.activity_log = is_truthy(&val);
    }

    config
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.lms-console/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_config_file(&path, &ConsoleConfig::default_toml())?;
    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `dashboard.log_limit`. The value is parsed
/// according to the type of the key's current (or default) value.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ConsoleConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Refuse to write a file that would no longer load.
    let updated: ConsoleConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;
    validate(&updated)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    write_config_file(&path, &output)
}

/// Reject values the dashboard cannot run with.
fn validate(config: &ConsoleConfig) -> Result<()> {
    if config.dashboard.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
        anyhow::bail!(
            "dashboard.refresh_interval_ms must be at least {MIN_REFRESH_INTERVAL_MS}, got {}",
            config.dashboard.refresh_interval_ms
        );
    }
    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// Sections missing from a partial file are filled from the defaults so any
/// known key can be set.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let defaults =
        toml::Value::try_from(ConsoleConfig::default()).context("failed to build defaults")?;
    let mut default_cursor = Some(&defaults);
    let mut current = root;

    for &part in sections {
        default_cursor = default_cursor.and_then(|d| d.get(part));
        let table = current
            .as_table_mut()
            .with_context(|| format!("expected table above '{part}' in '{key}'"))?;
        if !table.contains_key(part) {
            let fallback = default_cursor
                .cloned()
                .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
            table.insert(part.to_string(), fallback);
        }
        current = table
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{}'", sections.join(".")))?;

    let template = table
        .get(*leaf)
        .cloned()
        .or_else(|| default_cursor.and_then(|d| d.get(*leaf)).cloned())
        .with_context(|| format!("unknown config key: '{key}'"))?;

    let new_value = match template {
        toml::Value::Boolean(_) => toml::Value::Boolean(is_truthy(raw_value)),
        toml::Value::Integer(_) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        toml::Value::Float(_) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.lms-console/ directory")?;
    }
    fs::write(path, contents).context("failed to write config file")
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
