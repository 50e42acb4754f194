use serde_json::{Value, json};
use streak_core::calendar::MonthView;
use streak_core::config::Palette;
use streak_core::{Task, Tracker};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    name: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Streak")]
    streak: String,
    #[tabled(rename = "Today")]
    today: String,
}

pub fn short_id(task: &Task) -> String {
    task.id.to_string().chars().take(8).collect()
}

pub fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "name": task.name,
        "priority": task.priority,
        "color": task.color,
    })
}

pub fn task_with_streak_json(tracker: &Tracker, task: &Task) -> Value {
    let mut value = task_json(task);
    value["streak"] = json!(tracker.streak_for(task.id));
    value["done_today"] = json!(tracker.is_completed(tracker.today(), task.id));
    value
}

pub fn tasks_json(tracker: &Tracker) -> Value {
    Value::Array(
        tracker
            .tasks()
            .iter()
            .map(|task| task_with_streak_json(tracker, task))
            .collect(),
    )
}

pub fn tasks_table(tracker: &Tracker) -> String {
    if tracker.tasks().is_empty() {
        return "No tasks yet.".to_string();
    }

    let today = tracker.today();
    let rows: Vec<TaskRow> = tracker
        .tasks()
        .iter()
        .map(|task| {
            let streak = tracker.streak_for(task.id);
            TaskRow {
                id: short_id(task),
                name: task.name.clone(),
                priority: task.priority.to_string(),
                color: task
                    .color
                    .map(|color| color.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                streak: if streak > 0 {
                    format!("🔥 x{streak}")
                } else {
                    "-".to_string()
                },
                today: if tracker.is_completed(today, task.id) {
                    "done".to_string()
                } else {
                    String::new()
                },
            }
        })
        .collect();

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Sunday-first month grid; completed days carry a `*`.
pub fn calendar_grid(view: &MonthView, palette: &Palette) -> String {
    let mut lines = vec![
        format!("{:^20}", view.cursor.title()).trim_end().to_string(),
        "Su Mo Tu We Th Fr Sa".to_string(),
    ];

    let mut row = "   ".repeat(usize::from(view.cursor.leading_blanks()));
    let mut column = view.cursor.leading_blanks();
    for cell in &view.days {
        let number = format!("{:>2}", cell.date.day());
        if cell.completed.is_empty() {
            row.push_str(&number);
            row.push(' ');
        } else {
            row.push_str(&palette.completed(&format!("{number}*")));
        }

        column += 1;
        if column == 7 {
            lines.push(row.trim_end().to_string());
            row.clear();
            column = 0;
        }
    }
    if !row.trim().is_empty() {
        lines.push(row.trim_end().to_string());
    }

    lines.join("\n")
}

pub fn calendar_json(view: &MonthView) -> Value {
    json!({
        "title": view.cursor.title(),
        "year": view.cursor.year(),
        "month": u8::from(view.cursor.month()),
        "days": view
            .days
            .iter()
            .map(|cell| json!({
                "date": cell.date,
                "completed": cell.completed,
                "today": cell.is_today,
            }))
            .collect::<Vec<_>>(),
    })
}
