use crate::error::AppError;
use crate::model::{Priority, TaskColor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_ENV_VAR: &str = "STREAK_CONFIG_PATH";

/// Which streak definition drives notifications and the status badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMode {
    /// One streak per task; the badge counts tasks with a live streak.
    #[default]
    PerTask,
    /// One streak over days with any completion.
    Any,
}

impl fmt::Display for StreakMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerTask => f.write_str("per_task"),
            Self::Any => f.write_str("any"),
        }
    }
}

impl FromStr for StreakMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match canonical_name(raw).as_deref() {
            Some("per_task" | "task" | "tasks") => Ok(Self::PerTask),
            Some("any" | "single" | "global") => Ok(Self::Any),
            _ => Err(AppError::validation(format!(
                "unknown streak mode '{}'",
                raw.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Palette {
    pub completed: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn completed(&self, text: &str) -> String {
        paint(self.completed, self.reset, text)
    }
}

fn paint(color: &str, reset: &str, text: &str) -> String {
    if color.is_empty() {
        text.to_string()
    } else {
        format!("{color}{text}{reset}")
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            completed: "\x1b[38;5;208m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            completed: "\x1b[38;5;166m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            completed: "",
            reset: "",
        },
    }
}

/// Lowercases and collapses non-alphanumeric runs to `_`.
fn canonical_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let name = canonical_name(raw).unwrap_or_else(|| "default".to_string());
    let name = match name.as_str() {
        "vanilla" | "light" => "default".to_string(),
        "dark" | "dark_mode" | "darkmode" => "noir".to_string(),
        _ => name,
    };
    Some(name)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub streak_mode: StreakMode,
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default)]
    pub default_color: Option<TaskColor>,
    #[serde(default)]
    pub theme: Option<String>,
}

impl Config {
    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub streak_mode: Option<StreakMode>,
    pub default_priority: Option<Priority>,
    pub default_color: Option<TaskColor>,
    pub theme: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("streak").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("streak")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "using default config");
            ConfigLoad {
                config: Config::default(),
                error: Some(err),
            }
        }
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(mode) = overrides.streak_mode {
        merged.streak_mode = mode;
    }
    if let Some(priority) = overrides.default_priority {
        merged.default_priority = priority;
    }
    if let Some(color) = overrides.default_color {
        merged.default_color = Some(color);
    }
    if let Some(theme) = overrides.theme.as_deref() {
        merged.theme = canonical_theme_name(theme);
    }
    merged
}
