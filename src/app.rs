//! Application state for one running view.
//!
//! `App` owns the task list, focus history, timer and view state. Every
//! mutation goes through a method here and ends in an explicit save of the
//! record it touched, so save points are deterministic.

use crate::clock::Clock;
use crate::config::Config;
use crate::history::{Heatmap, History};
use crate::insight::{InsightDispatcher, InsightKind, InsightRequest};
use crate::shell::{HostShell, ResizeRequest};
use crate::storage::Persistence;
use crate::task::{INSIGHT_TITLE_LIMIT, Task, TaskPatch, TaskStore};
use crate::timer::{Mode, Ticker, Timer, TimerEvent};
use std::time::Instant;
use tracing::info;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum View {
    Main,
    Help,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum InputMode {
    Normal,
    Adding { recurring: bool },
}

pub struct App {
    pub config: Config,
    pub tasks: TaskStore,
    pub history: History,
    pub timer: Timer,
    pub view: View,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub selected: usize,
    pub compact: bool,
    pub daily_insight: Option<String>,
    pub motivation: Option<String>,
    ticker: Ticker,
    tasks_announced: bool,
    persistence: Persistence,
    insight: Option<InsightDispatcher>,
    shell: Box<dyn HostShell>,
    clock: Box<dyn Clock>,
}

impl App {
    /// Loads both records and runs the once-per-session recurring reset.
    pub fn new(
        config: Config,
        persistence: Persistence,
        shell: Box<dyn HostShell>,
        insight: Option<InsightDispatcher>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let today = clock.today();
        let (tasks, reset) = TaskStore::load(persistence.load_tasks(), today);
        let history = persistence.load_history();
        info!(tasks = tasks.len(), days = history.iter().count(), "state loaded");

        let mut app = Self {
            timer: Timer::new(config.durations()),
            config,
            tasks,
            history,
            view: View::Main,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            selected: 0,
            compact: false,
            daily_insight: None,
            motivation: None,
            ticker: Ticker::default(),
            tasks_announced: false,
            persistence,
            insight,
            shell,
            clock,
        };
        if reset > 0 {
            app.persistence.save_tasks(app.tasks.tasks());
        }
        app.on_tasks_available();
        app
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    // ------------------------------------------------------------------
    // State-changed hooks
    // ------------------------------------------------------------------

    fn tasks_changed(&mut self) {
        self.persistence.save_tasks(self.tasks.tasks());
        let len = self.tasks.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        self.on_tasks_available();
    }

    fn history_changed(&mut self) {
        self.persistence.save_history(&self.history);
    }

    /// Fires once per view, the first time there is an open task to talk about.
    fn on_tasks_available(&mut self) {
        if self.tasks_announced {
            return;
        }
        let Some(request) =
            InsightRequest::prioritize(self.tasks.incomplete_titles(INSIGHT_TITLE_LIMIT))
        else {
            return;
        };
        self.tasks_announced = true;
        if let Some(insight) = &self.insight {
            insight.request(request);
        }
    }

    // ------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------

    pub fn toggle_timer(&mut self, now: Instant) {
        self.timer.toggle();
        self.sync_ticker(now);
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
        self.ticker.disarm();
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        self.timer.switch_mode(mode);
        self.ticker.disarm();
    }

    fn sync_ticker(&mut self, now: Instant) {
        if self.timer.is_running() {
            self.ticker.arm(now);
        } else {
            self.ticker.disarm();
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Applies the seconds that have elapsed, then any insight replies.
    /// Returns the timer events so the caller can signal them.
    pub fn advance(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        for _ in 0..self.ticker.due(now) {
            if let Some(event) = self.timer.tick() {
                events.push(event);
            }
            if !self.timer.is_running() {
                break;
            }
        }
        self.sync_ticker(now);

        for event in &events {
            match *event {
                TimerEvent::SessionComplete { minutes } => self.on_session_complete(minutes),
            }
        }
        self.apply_insight_replies();
        events
    }

    pub fn on_session_complete(&mut self, minutes: u32) {
        let today = self.today();
        let total = self.history.record_session(today, minutes);
        info!(minutes, total, %today, "focus session complete");
        self.history_changed();

        if let Some(insight) = &self.insight {
            insight.request(InsightRequest::motivate(self.tasks.completed_on(today), total));
        }
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub fn sorted_tasks(&self) -> Vec<&Task> {
        self.tasks.sorted_view()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.sorted_view().get(self.selected).copied()
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    pub fn add_task(&mut self, title: &str, recurring: bool) -> bool {
        let now = self.clock.now();
        if self.tasks.add(title, recurring, now).is_none() {
            return false;
        }
        self.tasks_changed();
        true
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let today = self.today();
        let changed = self.tasks.update(id, patch, today);
        if changed {
            self.tasks_changed();
        }
        changed
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let changed = self.tasks.delete(id);
        if changed {
            self.tasks_changed();
        }
        changed
    }

    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (id, done) = (task.id.clone(), task.is_completed);
        self.update_task(&id, TaskPatch::completed(!done));
    }

    pub fn adjust_selected_progress(&mut self, delta: i64) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if task.is_completed {
            return;
        }
        let (id, progress) = (task.id.clone(), task.progress as i64);
        self.update_task(&id, TaskPatch::progress(progress + delta));
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.delete_task(&id);
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.tasks.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // Input and view
    // ------------------------------------------------------------------

    pub fn start_adding(&mut self, recurring: bool) {
        self.input_mode = InputMode::Adding { recurring };
        self.input_buffer.clear();
    }

    pub fn submit_input(&mut self) {
        if let InputMode::Adding { recurring } = self.input_mode {
            let title = std::mem::take(&mut self.input_buffer);
            self.add_task(&title, recurring);
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    pub fn toggle_compact(&mut self) {
        self.compact = !self.compact;
        self.shell.request_resize(ResizeRequest::for_mode(self.compact));
    }

    pub fn toggle_help(&mut self) {
        self.view = match self.view {
            View::Help => View::Main,
            View::Main => View::Help,
        };
    }

    pub fn heatmap(&self) -> Heatmap {
        self.history.heatmap(self.today(), self.config.heatmap_weeks)
    }

    pub fn focus_minutes_today(&self) -> u32 {
        self.history.minutes_on(self.today())
    }

    fn apply_insight_replies(&mut self) {
        let Some(insight) = self.insight.as_mut() else {
            return;
        };
        for reply in insight.drain() {
            match reply.kind {
                InsightKind::Daily => self.daily_insight = Some(reply.text),
                InsightKind::Motivation => self.motivation = Some(reply.text),
            }
        }
    }

    /// Tears the view down: the tick trigger stops and pending insight
    /// replies will be dropped on arrival.
    pub fn close(&mut self) {
        self.timer.pause();
        self.ticker.disarm();
        self.insight = None;
    }
}
