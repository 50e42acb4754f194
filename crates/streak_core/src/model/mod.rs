mod task;

pub use task::{Priority, Task, TaskColor, TaskEdit, TaskId};
