use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use streak_cli::cli::{Cli, Command, collect_config_overrides, resolve_task};
use streak_cli::render;
use streak_core::config::{Config, load_config_with_fallback, merge_overrides};
use streak_core::date_key::clock_from_env;
use streak_core::notify::{EventBus, StreakEvent, badge_label};
use streak_core::storage::JsonFileStore;
use streak_core::{AppError, TaskEdit, Tracker};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing() {
    // Opt-in via RUST_LOG; stdout is reserved for command output.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: {err}; using default configuration");
    }
    let overrides = collect_config_overrides(raw_overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn open_tracker(config: &Config, bus: EventBus) -> Result<Tracker, AppError> {
    let store = JsonFileStore::from_env()?;
    let clock = clock_from_env()?;
    let tracker = Tracker::open(Box::new(store), clock, bus, config.streak_mode);
    if let Some(err) = tracker.load_error() {
        eprintln!("WARNING: {err}; starting from an empty state");
    }
    Ok(tracker)
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::validation(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::validation("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(
    tracker: &mut Tracker,
    config: &Config,
    command: Command,
    json: bool,
) -> Result<(), AppError> {
    debug!(?command, json, "running command");
    match command {
        Command::Add {
            name,
            priority,
            color,
        } => {
            let name = match name {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::validation("task name is required")),
            };
            let task = tracker.add_task(
                &name,
                priority.unwrap_or(config.default_priority),
                color.or(config.default_color),
            )?;
            if json {
                println!("{}", render::task_json(&task));
            } else {
                println!("Added task: {} ({})", task.name, task.id);
            }
        }
        Command::Rename { task, new_name } => {
            let id = resolve_task(tracker.tasks(), &task)?;
            let task = tracker.rename_task(id, &new_name)?;
            if json {
                println!("{}", render::task_json(&task));
            } else {
                println!("Renamed task: {} ({})", task.name, task.id);
            }
        }
        Command::Edit {
            task,
            name,
            priority,
            color,
            clear_color,
        } => {
            let id = resolve_task(tracker.tasks(), &task)?;
            let edit = TaskEdit {
                name,
                priority,
                color: if clear_color { Some(None) } else { color.map(Some) },
            };
            let task = tracker.edit_task(id, edit)?;
            if json {
                println!("{}", render::task_json(&task));
            } else {
                println!("Updated task: {} ({})", task.name, task.id);
            }
        }
        Command::Delete { task } => {
            let id = resolve_task(tracker.tasks(), &task)?;
            let task = tracker.delete_task(id)?;
            if json {
                println!("{}", render::task_json(&task));
            } else {
                println!("Deleted task: {} ({})", task.name, task.id);
            }
        }
        Command::Toggle { task, date } => {
            let id = resolve_task(tracker.tasks(), &task)?;
            let date = date.unwrap_or_else(|| tracker.today());
            let done = tracker.toggle_completion(date, id)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": id,
                        "date": date,
                        "completed": done,
                        "streak": tracker.streak_for(id),
                    })
                );
            } else {
                let state = if done { "done" } else { "not done" };
                println!("Marked {state} on {date}: {}", display_name(tracker, id));
            }
        }
        Command::Done { task } => {
            let id = resolve_task(tracker.tasks(), &task)?;
            tracker.mark_done_today(id)?;
            let streak = tracker.streak_for(id);
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": id,
                        "date": tracker.today(),
                        "completed": true,
                        "streak": streak,
                    })
                );
            } else {
                println!(
                    "Done today: {} ({})",
                    display_name(tracker, id),
                    badge_label(streak as usize)
                );
            }
        }
        Command::ToggleAll { date } => {
            let date = date.unwrap_or_else(|| tracker.today());
            tracker.toggle_all_on_date(date)?;
            let completed = tracker.completed_on(date).map_or(0, |ids| ids.len());
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "date": date, "completed": completed })
                );
            } else if completed == 0 {
                println!("Cleared {date}");
            } else {
                println!("Completed {completed} task(s) on {date}");
            }
        }
        Command::List => {
            if json {
                println!("{}", render::tasks_json(tracker));
            } else {
                println!("{}", render::tasks_table(tracker));
            }
        }
        Command::Streak { task, any } => {
            if any {
                let streak = tracker.streak_any();
                if json {
                    println!("{}", serde_json::json!({ "streakCount": streak }));
                } else {
                    println!("Any-task streak: {streak}");
                }
            } else if let Some(task) = task {
                let id = resolve_task(tracker.tasks(), &task)?;
                let streak = tracker.streak_for(id);
                if json {
                    println!("{}", serde_json::json!({ "id": id, "streak": streak }));
                } else {
                    println!("{}: {streak}", display_name(tracker, id));
                }
            } else if json {
                println!("{}", render::tasks_json(tracker));
            } else {
                for task in tracker.tasks() {
                    println!("{}: {}", task.name, tracker.streak_for(task.id));
                }
            }
        }
        Command::Status => {
            let badge = tracker.badge();
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "mode": tracker.mode(),
                        "badge": badge,
                        "event": tracker.current_event(),
                    })
                );
            } else {
                println!("{}", badge_label(badge));
            }
        }
        Command::Calendar { offset } => {
            let cursor = tracker.current_month().offset(offset)?;
            let view = tracker.month_view(cursor);
            if json {
                println!("{}", render::calendar_json(&view));
            } else {
                println!("{}", render::calendar_grid(&view, &config.palette()));
            }
        }
    }

    Ok(())
}

fn display_name(tracker: &Tracker, id: streak_core::TaskId) -> String {
    tracker
        .task(id)
        .map(|task| task.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn run_interactive() -> Result<(), AppError> {
    let config = load_config(&[])?;
    let bus = EventBus::new();
    // Stand-in for the status bar label.
    let _status = bus.subscribe(|event: &StreakEvent| -> Result<(), AppError> {
        println!("[status] {}", badge_label(event.badge_count()));
        Ok(())
    });
    let mut tracker = open_tracker(&config, bus)?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("streak".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        let overrides = match collect_config_overrides(&cli.config_override) {
            Ok(overrides) => overrides,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };
        let line_config = merge_overrides(&config, &overrides);
        tracker.set_mode(line_config.streak_mode);

        if let Err(err) = run_command(&mut tracker, &line_config, cli.command, cli.json) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config_override)?;
    let mut tracker = open_tracker(&config, EventBus::new())?;
    run_command(&mut tracker, &config, cli.command, cli.json)
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
