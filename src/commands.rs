//! Non-interactive subcommands. Each loads state, runs the recurring reset,
//! applies one change and saves, exactly like a short-lived view would.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::history::{Heatmap, Intensity};
use crate::insight::{GeminiClient, InsightRequest, resolve};
use crate::storage::Persistence;
use crate::task::{INSIGHT_TITLE_LIMIT, Task, TaskPatch, TaskStore};
use std::fmt::Write as _;

pub struct Session<'a> {
    pub persistence: &'a Persistence,
    pub clock: &'a dyn Clock,
}

impl<'a> Session<'a> {
    pub fn new(persistence: &'a Persistence, clock: &'a dyn Clock) -> Self {
        Self { persistence, clock }
    }

    pub fn system(persistence: &'a Persistence) -> Self {
        Self::new(persistence, &SystemClock)
    }

    fn load_tasks(&self) -> TaskStore {
        let (store, reset) = TaskStore::load(self.persistence.load_tasks(), self.clock.today());
        if reset > 0 {
            self.persistence.save_tasks(store.tasks());
        }
        store
    }

    fn resolve_id(store: &TaskStore, prefix: &str) -> Result<String, String> {
        store
            .find_by_prefix(prefix)
            .map(|t| t.id.clone())
            .ok_or_else(|| format!("No unique task matches '{prefix}'."))
    }

    pub fn add(&self, title: &str, recurring: bool) -> Result<String, String> {
        let mut store = self.load_tasks();
        let id = store
            .add(title, recurring, self.clock.now())
            .map(|t| t.id.clone())
            .ok_or_else(|| "Task title cannot be empty.".to_string())?;
        self.persistence.save_tasks(store.tasks());
        Ok(format!("Task added ({}).", short_id(&id)))
    }

    pub fn list(&self) -> String {
        let store = self.load_tasks();
        let mut out = format!("Tasks  {}/{} Done\n", store.completed_count(), store.len());
        if store.is_empty() {
            out.push_str("  No tasks yet.\n");
        }
        for task in store.sorted_view() {
            let _ = writeln!(out, "  {}", format_task(task));
        }
        out
    }

    pub fn set_completed(&self, prefix: &str, done: bool) -> Result<String, String> {
        self.patch(prefix, TaskPatch::completed(done)).map(|t| {
            if done {
                format!("Completed '{}'.", t.title)
            } else {
                format!("Reopened '{}'.", t.title)
            }
        })
    }

    pub fn set_progress(&self, prefix: &str, progress: i64) -> Result<String, String> {
        self.patch(prefix, TaskPatch::progress(progress))
            .map(|t| format!("'{}' is {}% done.", t.title, t.progress))
    }

    fn patch(&self, prefix: &str, patch: TaskPatch) -> Result<Task, String> {
        let mut store = self.load_tasks();
        let id = Self::resolve_id(&store, prefix)?;
        store.update(&id, patch, self.clock.today());
        self.persistence.save_tasks(store.tasks());
        store
            .get(&id)
            .cloned()
            .ok_or_else(|| format!("Task '{prefix}' disappeared."))
    }

    pub fn remove(&self, prefix: &str) -> Result<String, String> {
        let mut store = self.load_tasks();
        let id = Self::resolve_id(&store, prefix)?;
        store.delete(&id);
        self.persistence.save_tasks(store.tasks());
        Ok(format!("Task {} removed.", short_id(&id)))
    }

    pub fn heatmap(&self, weeks: u32) -> String {
        let history = self.persistence.load_history();
        let today = self.clock.today();
        let mut out = render_heatmap_text(&history.heatmap(today, weeks));
        let _ = writeln!(
            out,
            "Today {} min  •  Total {} min over {} days",
            history.minutes_on(today),
            history.total_minutes(),
            history.active_days()
        );
        out
    }

    /// Prioritisation advice for the open tasks; always returns some text.
    pub async fn insight(&self, config: &Config) -> String {
        let store = self.load_tasks();
        let Some(request) = InsightRequest::prioritize(store.incomplete_titles(INSIGHT_TITLE_LIMIT))
        else {
            return "No open tasks. Add one first.".into();
        };
        match GeminiClient::new(config.insight.clone()) {
            Ok(client) => resolve(&client, &request).await,
            Err(e) => crate::insight::fallback(request.kind(), &e).to_string(),
        }
    }
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn format_task(task: &Task) -> String {
    let check = if task.is_completed { "[✓]" } else { "[ ]" };
    let recur = if task.is_recurring { " ↻" } else { "" };
    if task.is_completed {
        format!("{} {check} {}{recur}", short_id(&task.id), task.title)
    } else {
        format!("{} {check} {}{recur}  {:>3}%", short_id(&task.id), task.title, task.progress)
    }
}

/// Plain-text heatmap: one row per weekday, one glyph per day.
pub fn render_heatmap_text(heatmap: &Heatmap) -> String {
    const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let mut out = String::new();
    for (d, day) in DAYS.iter().enumerate() {
        out.push_str(day);
        out.push(' ');
        for cell in heatmap.row(d) {
            out.push(if cell.upcoming { ' ' } else { glyph(cell.intensity) });
        }
        out.push('\n');
    }
    out.push_str("    less ");
    out.extend(Intensity::ALL.iter().map(|&i| glyph(i)));
    out.push_str(" more\n");
    out
}

fn glyph(intensity: Intensity) -> char {
    match intensity {
        Intensity::Empty => '·',
        Intensity::Lightest => '░',
        Intensity::Light => '▒',
        Intensity::Medium => '▓',
        Intensity::Darkest => '█',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Local, TimeZone};

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap())
    }

    #[test]
    fn add_list_complete_remove() {
        let persistence = Persistence::in_memory();
        let clock = clock();
        let session = Session::new(&persistence, &clock);

        assert!(session.add("   ", false).is_err());
        session.add("Write report", false).unwrap();
        let id = persistence.load_tasks()[0].id.clone();

        assert!(session.list().contains("Write report"));
        assert!(session.list().starts_with("Tasks  0/1 Done"));

        session.set_progress(&id[..6], 42).unwrap();
        assert_eq!(persistence.load_tasks()[0].progress, 40);

        session.set_completed(&id, true).unwrap();
        let saved = &persistence.load_tasks()[0];
        assert!(saved.is_completed);
        assert_eq!(saved.progress, 100);
        assert_eq!(saved.last_completed_date, Some(clock.today()));

        session.remove(&id).unwrap();
        assert!(persistence.load_tasks().is_empty());
        assert!(session.remove(&id).is_err());
    }

    #[test]
    fn progress_on_a_completed_task_keeps_it_full() {
        let persistence = Persistence::in_memory();
        let clock = clock();
        let session = Session::new(&persistence, &clock);
        session.add("x", false).unwrap();
        let id = persistence.load_tasks()[0].id.clone();

        session.set_completed(&id, true).unwrap();
        assert_eq!(session.set_progress(&id, 30).unwrap(), "'x' is 100% done.");
        let saved = &persistence.load_tasks()[0];
        assert!(saved.is_completed);
        assert_eq!(saved.progress, 100);
    }

    #[test]
    fn text_heatmap_has_seven_rows_and_legend() {
        let persistence = Persistence::in_memory();
        let clock = clock();
        let text = Session::new(&persistence, &clock).heatmap(4);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("Sun ····"));
        // Wednesday is today; Thursday onward is still blank this week.
        assert!(lines[4].starts_with("Thu ··· "));
    }
}
