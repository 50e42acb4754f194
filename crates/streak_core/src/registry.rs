use crate::error::AppError;
use crate::model::{Priority, Task, TaskColor, TaskEdit, TaskId};
use tracing::{debug, warn};

/// Ordered collection of tasks. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut registry = Self::new();
        for mut task in tasks {
            if registry.get(task.id).is_some() {
                warn!(task_id = %task.id, "dropping duplicate task id");
                continue;
            }
            match validated_name(&task.name) {
                Ok(name) => task.name = name,
                Err(_) => {
                    warn!(task_id = %task.id, "dropping task with blank name");
                    continue;
                }
            }
            registry.tasks.push(task);
        }
        registry
    }

    pub fn add(
        &mut self,
        name: &str,
        priority: Priority,
        color: Option<TaskColor>,
    ) -> Result<Task, AppError> {
        let name = validated_name(name)?;
        let task = Task {
            id: TaskId::new(),
            name,
            color,
            priority,
        };
        debug!(task_id = %task.id, name = %task.name, "task added");
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn rename(&mut self, id: TaskId, new_name: &str) -> Result<Task, AppError> {
        self.edit(
            id,
            TaskEdit {
                name: Some(new_name.to_string()),
                ..TaskEdit::default()
            },
        )
    }

    /// Applies every field of `edit` or none of them.
    pub fn edit(&mut self, id: TaskId, edit: TaskEdit) -> Result<Task, AppError> {
        let name = edit.name.as_deref().map(validated_name).transpose()?;
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;

        if let Some(name) = name {
            task.name = name;
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }
        if let Some(color) = edit.color {
            task.color = color;
        }

        debug!(task_id = %id, "task edited");
        Ok(task.clone())
    }

    pub fn remove(&mut self, id: TaskId) -> Result<Task, AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;
        Ok(self.tasks.remove(index))
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.id).collect()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn validated_name(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("task name is required"));
    }
    Ok(trimmed.to_string())
}
