use clap::{Parser, Subcommand};
use streak_core::AppError;
use streak_core::config::{ConfigOverrides, StreakMode};
use streak_core::{DateKey, Priority, Task, TaskColor, TaskId};

#[derive(Parser, Debug)]
#[command(name = "streak", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: streak add "Meditate" --priority high --color blue
    Add {
        name: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        color: Option<TaskColor>,
    },
    /// Rename a task
    ///
    /// Example: streak rename Meditate "Evening meditation"
    Rename { task: String, new_name: String },
    /// Change a task's name, priority or color
    ///
    /// Example: streak edit Meditate --priority low --clear-color
    Edit {
        task: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_color")]
        color: Option<TaskColor>,
        #[arg(long)]
        clear_color: bool,
    },
    /// Delete a task and its completion history
    ///
    /// Example: streak delete Meditate
    Delete { task: String },
    /// Flip a task's completion on a day (today by default)
    ///
    /// Example: streak toggle Meditate --date 2025-07-10
    Toggle {
        task: String,
        #[arg(long)]
        date: Option<DateKey>,
    },
    /// Mark a task done today
    ///
    /// Example: streak done Meditate
    Done { task: String },
    /// Clear a day if anything is done on it, otherwise complete every task
    ///
    /// Example: streak toggle-all --date 2025-07-10
    ToggleAll {
        #[arg(long)]
        date: Option<DateKey>,
    },
    /// List tasks with their streaks
    ///
    /// Example: streak list
    List,
    /// Show streaks
    ///
    /// Example: streak streak Meditate
    /// Example: streak streak --any
    Streak {
        #[arg(conflicts_with = "any")]
        task: Option<String>,
        /// Consecutive days with any completion
        #[arg(long)]
        any: bool,
    },
    /// Show the status badge
    ///
    /// Example: streak status
    Status,
    /// Show a month grid with completed days marked
    ///
    /// Example: streak calendar --offset -1
    Calendar {
        /// Months relative to the current one
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StreakMode(StreakMode),
    DefaultPriority(Priority),
    DefaultColor(TaskColor),
    Theme(String),
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ConfigOverrideTarget, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;
    let value = value_raw.trim();

    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    match field.as_str() {
        "streak_mode" | "mode" => value
            .parse()
            .map(ConfigOverrideTarget::StreakMode)
            .map_err(|err: AppError| err.message().to_string()),
        "default_priority" | "priority" => value
            .parse()
            .map(ConfigOverrideTarget::DefaultPriority)
            .map_err(|err: AppError| err.message().to_string()),
        "default_color" | "color" => value
            .parse()
            .map(ConfigOverrideTarget::DefaultColor)
            .map_err(|err: AppError| err.message().to_string()),
        "theme" => Ok(ConfigOverrideTarget::Theme(value.to_string())),
        other => Err(format!("unknown config field '{other}'")),
    }
}

pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        match parse_config_override(entry).map_err(AppError::validation)? {
            ConfigOverrideTarget::StreakMode(mode) => overrides.streak_mode = Some(mode),
            ConfigOverrideTarget::DefaultPriority(priority) => {
                overrides.default_priority = Some(priority)
            }
            ConfigOverrideTarget::DefaultColor(color) => overrides.default_color = Some(color),
            ConfigOverrideTarget::Theme(theme) => overrides.theme = Some(theme),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Finds a task by full id, unique id prefix, or case-insensitive name.
pub fn resolve_task(tasks: &[Task], raw: &str) -> Result<TaskId, AppError> {
    let wanted = raw.trim();
    if wanted.is_empty() {
        return Err(AppError::validation("task is required"));
    }

    if let Ok(id) = TaskId::parse(wanted) {
        return tasks
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")));
    }

    let by_name: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.name.eq_ignore_ascii_case(wanted))
        .collect();
    if let [task] = by_name.as_slice() {
        return Ok(task.id);
    }

    let lowered = wanted.to_ascii_lowercase();
    let by_prefix: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.id.to_string().starts_with(&lowered))
        .collect();

    match (by_name.len(), by_prefix.as_slice()) {
        (0, [task]) => Ok(task.id),
        (0, []) => Err(AppError::not_found(format!("no task matches '{wanted}'"))),
        _ => Err(AppError::validation(format!(
            "'{wanted}' matches more than one task; use its id"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, collect_config_overrides, parse_config_override,
        resolve_task,
    };
    use clap::Parser;
    use streak_core::config::StreakMode;
    use streak_core::{Priority, Task, TaskColor, TaskId};

    fn task(name: &str) -> Task {
        Task {
            id: TaskId::new(),
            name: name.to_string(),
            color: None,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Streak-Mode = any ").unwrap();
        assert_eq!(parsed, ConfigOverrideTarget::StreakMode(StreakMode::Any));
    }

    #[test]
    fn parse_config_override_parses_typed_values() {
        assert_eq!(
            parse_config_override("default_color=purple").unwrap(),
            ConfigOverrideTarget::DefaultColor(TaskColor::Purple)
        );
        assert!(
            parse_config_override("priority=urgent")
                .unwrap_err()
                .contains("unknown priority")
        );
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn collect_config_overrides_keeps_last_value() {
        let overrides = collect_config_overrides(&[
            "theme=noir".to_string(),
            "mode=any".to_string(),
            "mode=per_task".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("noir"));
        assert_eq!(overrides.streak_mode, Some(StreakMode::PerTask));
        assert!(collect_config_overrides(&["=x".to_string()]).is_err());
    }

    #[test]
    fn resolve_task_by_name_prefix_and_id() {
        let run = task("Run");
        let read = task("Read");
        let tasks = vec![run.clone(), read.clone()];

        assert_eq!(resolve_task(&tasks, "run").unwrap(), run.id);
        assert_eq!(resolve_task(&tasks, &read.id.to_string()).unwrap(), read.id);
        let prefix: String = run.id.to_string().chars().take(12).collect();
        assert_eq!(resolve_task(&tasks, &prefix).unwrap(), run.id);
        assert_eq!(
            resolve_task(&tasks, "Swim").unwrap_err().code(),
            "not_found"
        );
        assert_eq!(
            resolve_task(&tasks, &TaskId::new().to_string())
                .unwrap_err()
                .code(),
            "not_found"
        );
    }

    #[test]
    fn resolve_task_rejects_duplicate_names() {
        let tasks = vec![task("Run"), task("run")];
        assert_eq!(
            resolve_task(&tasks, "RUN").unwrap_err().code(),
            "validation_error"
        );
    }

    #[test]
    fn add_parses_priority_and_color() {
        let cli = Cli::try_parse_from([
            "streak", "add", "Meditate", "--priority", "high", "--color", "Blue",
        ])
        .unwrap();

        match cli.command {
            Command::Add {
                name,
                priority,
                color,
            } => {
                assert_eq!(name.as_deref(), Some("Meditate"));
                assert_eq!(priority, Some(Priority::High));
                assert_eq!(color, Some(TaskColor::Blue));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn calendar_accepts_negative_offset() {
        let cli = Cli::try_parse_from(["streak", "calendar", "--offset", "-2"]).unwrap();
        match cli.command {
            Command::Calendar { offset } => assert_eq!(offset, -2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn toggle_rejects_malformed_date() {
        assert!(Cli::try_parse_from(["streak", "toggle", "Run", "--date", "07/10/2025"]).is_err());
    }
}
