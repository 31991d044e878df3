use crate::app::{App, InputMode, View};
use crate::history::{Heatmap, Intensity};
use crate::task::Task;
use crate::timer::Mode;
use ratatui::{prelude::*, widgets::*};

#[derive(Clone, Copy)]
pub struct Theme {
    pub focus_color: Color,
    pub short_break_color: Color,
    pub long_break_color: Color,
    pub border_color: Color,
    pub accent_color: Color,
}

pub const THEMES: &[&str] = &["default", "nord", "dracula", "gruvbox", "solarized"];

pub fn get_theme(name: &str) -> Theme {
    match name {
        "nord" => Theme {
            focus_color: Color::Rgb(136, 192, 208),
            short_break_color: Color::Rgb(163, 190, 140),
            long_break_color: Color::Rgb(235, 203, 139),
            border_color: Color::Rgb(94, 129, 172),
            accent_color: Color::Rgb(180, 142, 173),
        },
        "dracula" => Theme {
            focus_color: Color::Rgb(189, 147, 249),
            short_break_color: Color::Rgb(80, 250, 123),
            long_break_color: Color::Rgb(241, 250, 140),
            border_color: Color::Rgb(98, 114, 164),
            accent_color: Color::Rgb(255, 121, 198),
        },
        "gruvbox" => Theme {
            focus_color: Color::Rgb(254, 128, 25),
            short_break_color: Color::Rgb(184, 187, 38),
            long_break_color: Color::Rgb(250, 189, 47),
            border_color: Color::Rgb(213, 196, 161),
            accent_color: Color::Rgb(251, 73, 52),
        },
        "solarized" => Theme {
            focus_color: Color::Rgb(38, 139, 210),
            short_break_color: Color::Rgb(133, 153, 0),
            long_break_color: Color::Rgb(181, 137, 0),
            border_color: Color::Rgb(88, 110, 117),
            accent_color: Color::Rgb(211, 54, 130),
        },
        _ => Theme {
            focus_color: Color::Rgb(10, 132, 255),
            short_break_color: Color::Rgb(48, 209, 88),
            long_break_color: Color::Rgb(255, 214, 10),
            border_color: Color::Rgb(90, 90, 90),
            accent_color: Color::Rgb(100, 181, 246),
        },
    }
}

fn mode_color(theme: &Theme, mode: Mode) -> Color {
    match mode {
        Mode::Focus => theme.focus_color,
        Mode::ShortBreak => theme.short_break_color,
        Mode::LongBreak => theme.long_break_color,
    }
}

fn intensity_color(intensity: Intensity) -> Color {
    match intensity {
        Intensity::Empty => Color::Rgb(58, 58, 58),
        Intensity::Lightest => Color::Rgb(14, 68, 41),
        Intensity::Light => Color::Rgb(0, 109, 50),
        Intensity::Medium => Color::Rgb(38, 166, 65),
        Intensity::Darkest => Color::Rgb(57, 211, 83),
    }
}

fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border_color))
}

// ============================================================================
// Layout
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &App) {
    let theme = get_theme(&app.config.theme);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.size());

    if app.compact {
        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(4)])
            .split(rows[0]);
        render_timer(f, app, &theme, body[0]);
        render_tasks(f, app, &theme, body[1]);
    } else {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
            .split(rows[0]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(11),
                Constraint::Length(5),
                Constraint::Min(11),
            ])
            .split(cols[0]);
        render_timer(f, app, &theme, left[0]);
        render_insight(f, app, &theme, left[1]);
        render_heatmap(f, app, &theme, left[2]);
        render_tasks(f, app, &theme, cols[1]);
    }

    render_footer(f, app, &theme, rows[1]);

    if app.view == View::Help {
        render_help(f, &theme);
    }
}

// ============================================================================
// Panels
// ============================================================================

fn render_timer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = panel(" 🍅 FocusFlow ", theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let color = mode_color(theme, app.timer.mode());
    let tabs: Vec<Span> = Mode::ALL
        .iter()
        .flat_map(|m| {
            let style = if *m == app.timer.mode() {
                Style::default().fg(Color::Black).bg(mode_color(theme, *m)).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(format!(" {} ", m.label()), style), Span::raw(" ")]
        })
        .collect();

    let status = if app.timer.is_running() {
        Span::styled("● RUNNING  Stay focused", Style::default().fg(Color::Green))
    } else {
        Span::styled("⏸ Ready to start?", Style::default().fg(Color::Yellow))
    };

    let mut lines = vec![Line::from(tabs).alignment(Alignment::Center), Line::from("")];
    if !app.compact {
        lines.push(
            Line::from(Span::styled(
                app.timer.mode().name(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );
    }
    lines.push(
        Line::from(Span::styled(
            app.timer.formatted(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
    );
    lines.push(Line::from(status).alignment(Alignment::Center));

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(inner);
    f.render_widget(Paragraph::new(lines), sections[0]);
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .ratio(app.timer.progress_ratio()),
        sections[1],
    );
}

fn render_insight(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let mut lines = Vec::new();
    match &app.daily_insight {
        Some(text) => lines.push(Line::from(Span::styled(
            format!("\"{text}\""),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Add a task to get a daily insight.",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    if let Some(text) = &app.motivation {
        lines.push(Line::from(Span::styled(
            format!("✨ {text}"),
            Style::default().fg(theme.accent_color),
        )));
    }
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel(" Daily Insight ", theme)),
        area,
    );
}

fn render_heatmap(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let heatmap = app.heatmap();
    let mut lines = heatmap_lines(&heatmap);

    let mut legend = vec![Span::styled("Less ", Style::default().fg(Color::DarkGray))];
    for tier in Intensity::ALL {
        legend.push(Span::styled("■ ", Style::default().fg(intensity_color(tier))));
    }
    legend.push(Span::styled("More", Style::default().fg(Color::DarkGray)));
    lines.push(Line::from(""));
    lines.push(Line::from(legend));
    lines.push(Line::from(Span::styled(
        format!(
            "Today {} min  •  Total {} min over {} days",
            app.focus_minutes_today(),
            app.history.total_minutes(),
            app.history.active_days()
        ),
        Style::default().fg(Color::Gray),
    )));

    f.render_widget(
        Paragraph::new(lines).block(panel(" Consistency Tracker ", theme)),
        area,
    );
}

pub fn heatmap_lines(heatmap: &Heatmap) -> Vec<Line<'static>> {
    const DAYS: [&str; 7] = ["S ", "M ", "T ", "W ", "T ", "F ", "S "];
    (0..7)
        .map(|d| {
            let mut spans = vec![Span::styled(DAYS[d], Style::default().fg(Color::DarkGray))];
            spans.extend(heatmap.row(d).map(|cell| {
                if cell.upcoming {
                    Span::raw("  ")
                } else {
                    Span::styled("■ ", Style::default().fg(intensity_color(cell.intensity)))
                }
            }));
            Line::from(spans)
        })
        .collect()
}

fn task_line<'a>(task: &'a Task, selected: bool, compact: bool, theme: &Theme) -> Line<'a> {
    let prefix = if selected { "► " } else { "  " };
    let check = if task.is_completed { "[✓] " } else { "[ ] " };
    let title_style = match (task.is_completed, selected) {
        (true, _) => Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT),
        (false, true) => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        (false, false) => Style::default().fg(Color::Gray),
    };

    let mut spans = vec![
        Span::styled(prefix, Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD)),
        Span::raw(check),
        Span::styled(task.title.as_str(), title_style),
    ];
    if task.is_recurring {
        spans.push(Span::styled(" ↻", Style::default().fg(Color::DarkGray)));
    }
    if !task.is_completed {
        let filled = (task.progress / 10).min(10) as usize;
        spans.push(Span::raw("  "));
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(theme.focus_color)));
        spans.push(Span::styled("░".repeat(10usize.saturating_sub(filled)), Style::default().fg(Color::DarkGray)));
        if !compact {
            spans.push(Span::styled(
                format!(" {:>3}%", task.progress),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    Line::from(spans)
}

fn render_tasks(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = format!(
        " Tasks  {}/{} Done ",
        app.tasks.completed_count(),
        app.tasks.len()
    );
    let block = panel(&title, theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(inner);

    let (prompt, style) = match app.input_mode {
        InputMode::Adding { recurring } => (
            format!("{}{}▏", if recurring { "↻ " } else { "" }, app.input_buffer),
            Style::default().fg(Color::White),
        ),
        InputMode::Normal => (
            if app.compact { "Add task... (a)" } else { "What needs to be done? (a / R for recurring)" }
                .to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(
        Paragraph::new(prompt).style(style).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
                    theme.border_color
                } else {
                    theme.accent_color
                })),
        ),
        sections[0],
    );

    let sorted = app.sorted_tasks();
    let lines: Vec<Line> = if sorted.is_empty() {
        vec![Line::from(Span::styled("No tasks yet.", Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center)]
    } else {
        sorted
            .iter()
            .enumerate()
            .map(|(i, t)| task_line(t, i == app.selected, app.compact, theme))
            .collect()
    };
    let height = sections[1].height as usize;
    let scroll = app.selected.saturating_sub(height.saturating_sub(1)) as u16;
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), sections[1]);
}

fn render_footer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let key = |k: &'static str| {
        Span::styled(k, Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD))
    };
    let controls = if app.input_mode == InputMode::Normal {
        Line::from(vec![
            key("Space"), Span::raw(" Start/Pause  "),
            key("r"), Span::raw(" Reset  "),
            key("1-3"), Span::raw(" Mode  "),
            key("a"), Span::raw(" Add  "),
            key("x"), Span::raw(" Done  "),
            key("c"), Span::raw(" Compact  "),
            key("?"), Span::raw(" Help  "),
            key("q"), Span::raw(" Quit"),
        ])
    } else {
        Line::from(vec![key("Enter"), Span::raw(" Save  "), key("Esc"), Span::raw(" Cancel")])
    };
    f.render_widget(
        Paragraph::new(controls)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn help_line<'a>(key: &'a str, desc: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::raw("    "),
        Span::styled(format!("{key:<10}"), Style::default().fg(theme.accent_color).add_modifier(Modifier::BOLD)),
        Span::raw(desc),
    ])
}

fn render_help(f: &mut Frame, theme: &Theme) {
    let area = centered_rect(70, 80, f.size());
    let lines = vec![
        Line::from(""),
        Line::from("  Timer:"),
        help_line("Space", "Start / pause", theme),
        help_line("r", "Reset current countdown", theme),
        help_line("1 2 3", "Focus / short break / long break", theme),
        Line::from(""),
        Line::from("  Tasks:"),
        help_line("a", "Add task", theme),
        help_line("R", "Add recurring (daily) task", theme),
        help_line("x Enter", "Toggle done", theme),
        help_line("+ -", "Progress ±10%", theme),
        help_line("d", "Delete task", theme),
        help_line("j k", "Move selection", theme),
        Line::from(""),
        Line::from("  View:"),
        help_line("c", "Toggle compact mode", theme),
        help_line("?", "Toggle this help", theme),
        help_line("q Esc", "Quit", theme),
    ];
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(panel(" ⌨️  Keyboard Shortcuts ", theme)), area);
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::Config;
    use crate::shell::NoopShell;
    use crate::storage::{KvStore, MemoryStore, Persistence, TASKS_KEY};
    use chrono::{Local, TimeZone};
    use ratatui::backend::TestBackend;

    fn bar_width(line: &Line) -> usize {
        line.spans
            .iter()
            .filter(|s| s.content.contains('█') || s.content.contains('░'))
            .map(|s| s.content.chars().count())
            .sum()
    }

    #[test]
    fn progress_bar_never_overflows() {
        let theme = get_theme("default");
        let mut task = Task {
            id: "a".into(),
            title: "a".into(),
            progress: 250,
            is_completed: false,
            is_recurring: false,
            last_completed_date: None,
            created_at: 0,
        };
        assert_eq!(bar_width(&task_line(&task, false, false, &theme)), 10);
        task.progress = 30;
        assert_eq!(bar_width(&task_line(&task, true, true, &theme)), 10);
    }

    #[test]
    fn out_of_range_stored_progress_renders() {
        let store = MemoryStore::default();
        store
            .set(
                TASKS_KEY,
                r#"[{"id":"a","title":"a","progress":150,"isCompleted":false,
                    "isRecurring":false,"lastCompletedDate":null,"createdAt":0}]"#,
            )
            .unwrap();
        let app = App::new(
            Config::default(),
            Persistence::new(store),
            Box::new(NoopShell),
            None,
            Box::new(FixedClock(Local.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap())),
        );
        assert_eq!(app.tasks.tasks()[0].progress, 100);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render_ui(f, &app)).unwrap();
    }
}
