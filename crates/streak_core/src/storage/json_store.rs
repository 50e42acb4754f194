use crate::completions::CompletionStore;
use crate::date_key::DateKey;
use crate::error::AppError;
use crate::model::{Task, TaskId};
use crate::registry::TaskRegistry;
use crate::storage::legacy::{LegacyState, fold_streak_dates};
use crate::storage::{StateStore, TrackerState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: u32 = 1;
pub const STORE_ENV_VAR: &str = "STREAK_STORE_PATH";
const STORE_FILE_NAME: &str = "state.json";

#[derive(Debug, Serialize)]
struct StoredState<'a> {
    schema_version: u32,
    tasks: &'a [Task],
    #[serde(rename = "taskCompletions")]
    task_completions: &'a CompletionStore,
}

#[derive(Debug, Deserialize)]
struct RawState {
    #[serde(default)]
    schema_version: Option<u32>,
    #[serde(default)]
    tasks: Vec<RawTask>,
    #[serde(default, rename = "taskCompletions")]
    task_completions: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "streakDates")]
    streak_dates: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTask {
    Current(Task),
    Legacy(String),
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("streak").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("streak")
            .join(STORE_FILE_NAME))
    }
}

/// JSON document on disk holding `tasks` and `taskCompletions`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<TrackerState, AppError> {
        load_state(&self.path)
    }

    fn save(&self, state: &TrackerState) -> Result<(), AppError> {
        save_state(&self.path, state)
    }
}

pub fn load_state(path: &Path) -> Result<TrackerState, AppError> {
    if !path.exists() {
        debug!(path = %path.display(), "no stored state");
        return Ok(TrackerState::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    decode_state(&content)
}

pub fn decode_state(content: &str) -> Result<TrackerState, AppError> {
    if content.trim().is_empty() {
        return Ok(TrackerState::default());
    }

    let raw: RawState =
        serde_json::from_str(content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if let Some(version) = raw.schema_version
        && !(1..=SCHEMA_VERSION).contains(&version)
    {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let mut current = Vec::new();
    let mut legacy = Vec::new();
    for task in raw.tasks {
        match task {
            RawTask::Current(task) => current.push(task),
            RawTask::Legacy(name) => legacy.push(name),
        }
    }

    if !legacy.is_empty() && !current.is_empty() {
        return Err(AppError::invalid_data("tasks mix names and task objects"));
    }

    if current.is_empty() && (!legacy.is_empty() || !raw.streak_dates.is_empty()) {
        info!("reading name-keyed state");
        return Ok(LegacyState::from_raw(legacy, raw.task_completions, raw.streak_dates).migrate());
    }

    let registry = TaskRegistry::from_tasks(current);
    let completions = decode_completions(raw.task_completions, &registry);
    let mut state = TrackerState {
        registry,
        completions,
    };
    fold_streak_dates(&mut state, raw.streak_dates);
    Ok(state)
}

fn decode_completions(
    raw: BTreeMap<String, Vec<String>>,
    registry: &TaskRegistry,
) -> CompletionStore {
    let mut skipped = 0usize;
    let mut days = Vec::with_capacity(raw.len());

    for (raw_date, raw_ids) in raw {
        let Ok(date) = DateKey::parse(&raw_date) else {
            warn!(date = %raw_date, "skipping unparseable date key");
            continue;
        };
        let mut completed = BTreeSet::new();
        for raw_id in raw_ids {
            match TaskId::parse(&raw_id) {
                Ok(id) if registry.contains(id) => {
                    completed.insert(id);
                }
                _ => skipped += 1,
            }
        }
        days.push((date, completed));
    }

    if skipped > 0 {
        warn!(skipped, "dropped completions for unknown tasks");
    }
    CompletionStore::from_days(days)
}

pub fn encode_state(state: &TrackerState) -> Result<String, AppError> {
    let stored = StoredState {
        schema_version: SCHEMA_VERSION,
        tasks: state.registry.tasks(),
        task_completions: &state.completions,
    };
    serde_json::to_string_pretty(&stored).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn save_state(path: &Path, state: &TrackerState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let content = encode_state(state)?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    debug!(path = %path.display(), tasks = state.registry.len(), "state saved");
    Ok(())
}
