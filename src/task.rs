//! Task list: the persisted [`Task`] record and the in-memory [`TaskStore`].

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PROGRESS_STEP: u8 = 10;

/// Maximum number of titles sent along with a prioritisation request.
pub const INSIGHT_TITLE_LIMIT: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    /// 0..=100 in steps of 10; always 100 while completed.
    pub progress: u8,
    pub is_completed: bool,
    pub is_recurring: bool,
    pub last_completed_date: Option<NaiveDate>,
    /// Creation time in epoch milliseconds, only used to order the list.
    pub created_at: i64,
}

impl Task {
    pub fn new(title: &str, is_recurring: bool, now: DateTime<Local>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            progress: 0,
            is_completed: false,
            is_recurring,
            last_completed_date: None,
            created_at: now.timestamp_millis(),
        }
    }

    /// True when a recurring task still carries a completion from an earlier day.
    pub fn is_stale_recurring(&self, today: NaiveDate) -> bool {
        self.is_recurring && self.is_completed && self.last_completed_date != Some(today)
    }
}

/// Clamps to 0..=100 and snaps to the nearest step.
pub fn normalize_progress(value: i64) -> u8 {
    let clamped = value.clamp(0, 100);
    let step = PROGRESS_STEP as i64;
    (((clamped + step / 2) / step) * step) as u8
}

/// Fields a caller may change on an existing task. `None` leaves the
/// stored value untouched. Recurrence is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub progress: Option<i64>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(done: bool) -> Self {
        Self {
            is_completed: Some(done),
            ..Self::default()
        }
    }

    pub fn progress(value: i64) -> Self {
        Self {
            progress: Some(value),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Stored records are trusted for shape only: progress is snapped back
    /// onto the 0..=100 grid and completed tasks are held at 100.
    pub fn new(mut tasks: Vec<Task>) -> Self {
        for task in &mut tasks {
            let progress = if task.is_completed {
                100
            } else {
                normalize_progress(task.progress as i64)
            };
            if progress != task.progress {
                debug!(id = %task.id, stored = task.progress, progress, "normalized task progress");
                task.progress = progress;
            }
        }
        Self { tasks }
    }

    /// Builds the store for a fresh session, clearing yesterday's
    /// completions on recurring tasks. Also returns how many were reset,
    /// so the caller knows whether to write the list back.
    pub fn load(tasks: Vec<Task>, today: NaiveDate) -> (Self, usize) {
        let mut store = Self::new(tasks);
        let reset = store.reset_recurring(today);
        (store, reset)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolves a unique id prefix, as typed on the command line.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Task> {
        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) if !prefix.is_empty() => Some(task),
            _ => None,
        }
    }

    /// Prepends a new task. Blank titles are ignored and yield `None`.
    pub fn add(&mut self, title: &str, is_recurring: bool, now: DateTime<Local>) -> Option<&Task> {
        if title.trim().is_empty() {
            debug!("ignoring task with blank title");
            return None;
        }
        let task = Task::new(title, is_recurring, now);
        debug!(id = %task.id, recurring = is_recurring, "task added");
        self.tasks.insert(0, task);
        self.tasks.first()
    }

    /// Merges `patch` into the task with `id`. Returns false for unknown ids.
    ///
    /// Completing a task forces progress to 100 and stamps `today`;
    /// un-completing clears the date and keeps progress unless the patch
    /// sets it.
    pub fn update(&mut self, id: &str, patch: TaskPatch, today: NaiveDate) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "update for unknown task ignored");
            return false;
        };

        if let Some(title) = patch.title {
            let title = title.trim();
            if !title.is_empty() {
                task.title = title.to_string();
            }
        }
        if let Some(progress) = patch.progress {
            task.progress = normalize_progress(progress);
        }
        match patch.is_completed {
            Some(true) => {
                task.is_completed = true;
                task.progress = 100;
                task.last_completed_date = Some(today);
            }
            Some(false) => {
                task.is_completed = false;
                task.last_completed_date = None;
            }
            None => {}
        }
        if task.is_completed {
            task.progress = 100;
        }
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        before != self.tasks.len()
    }

    /// Incomplete tasks first, each group newest first. Never stored.
    pub fn sorted_view(&self) -> Vec<&Task> {
        let mut view: Vec<&Task> = self.tasks.iter().collect();
        view.sort_by(|a, b| {
            a.is_completed
                .cmp(&b.is_completed)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        view
    }

    /// Returns the number of tasks that were reset.
    pub fn reset_recurring(&mut self, today: NaiveDate) -> usize {
        let mut reset = 0;
        for task in self.tasks.iter_mut().filter(|t| t.is_stale_recurring(today)) {
            task.is_completed = false;
            task.progress = 0;
            task.last_completed_date = None;
            reset += 1;
        }
        if reset > 0 {
            info!(count = reset, %today, "reset recurring tasks for a new day");
        }
        reset
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed).count()
    }

    /// Tasks completed on `today`, as reported to the motivation request.
    pub fn completed_on(&self, today: NaiveDate) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.is_completed && t.last_completed_date == Some(today))
            .count()
    }

    pub fn incomplete_titles(&self, limit: usize) -> Vec<String> {
        self.sorted_view()
            .into_iter()
            .filter(|t| !t.is_completed)
            .take(limit)
            .map(|t| t.title.clone())
            .collect()
    }
}
