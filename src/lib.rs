//! # FocusFlow
//!
//! A terminal focus companion: a pomodoro timer, a task list with daily
//! recurring tasks and progress tracking, a focus heatmap, and optional
//! model-generated insight text.
//!
//! State lives in two JSON records (tasks and day → minutes history) in the
//! data directory (`FOCUSFLOW_DATA_DIR`, or the platform data dir).

pub mod app;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod insight;
pub mod notify;
pub mod shell;
pub mod storage;
pub mod task;
pub mod timer;
pub mod ui;
