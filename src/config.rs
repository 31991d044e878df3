use crate::history::{DEFAULT_HEATMAP_WEEKS, MAX_HEATMAP_WEEKS};
use crate::timer::{
    DEFAULT_FOCUS_MINUTES, DEFAULT_LONG_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES, MAX_MINUTES,
    ModeDurations,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub heatmap_weeks: u32,
    pub sound_enabled: bool,
    pub theme: String,
    pub insight: InsightConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            heatmap_weeks: DEFAULT_HEATMAP_WEEKS,
            sound_enabled: true,
            theme: "default".into(),
            insight: InsightConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Read from `GEMINI_API_KEY`/`API_KEY`, never written to disk.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 10,
            api_key: None,
        }
    }
}

impl InsightConfig {
    pub fn with_env_key(mut self) -> Self {
        self.api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty());
        self
    }
}

impl Config {
    /// Reads `config.json` from `dir`; a missing or invalid file yields defaults.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let Ok(raw) = fs::read_to_string(&path) else {
            return Self::default();
        };
        let config: Self = serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring invalid config file");
            Self::default()
        });
        config.clamped()
    }

    /// Pulls every numeric setting into its supported range.
    pub fn clamped(mut self) -> Self {
        for minutes in [
            &mut self.focus_minutes,
            &mut self.short_break_minutes,
            &mut self.long_break_minutes,
        ] {
            *minutes = (*minutes).clamp(1, MAX_MINUTES);
        }
        self.heatmap_weeks = self.heatmap_weeks.clamp(1, MAX_HEATMAP_WEEKS);
        self
    }

    pub fn durations(&self) -> ModeDurations {
        ModeDurations {
            focus: self.focus_minutes,
            short_break: self.short_break_minutes,
            long_break: self.long_break_minutes,
        }
    }
}

/// Parses `25`, `25m`, `1h`, `1h30m` into whole minutes.
pub fn parse_minutes(s: &str) -> Result<u32, String> {
    let s = s.trim().to_lowercase();
    if let Ok(plain) = s.parse::<u32>() {
        return check_minutes(plain);
    }

    let mut total = 0u32;
    let mut num = String::new();
    for c in s.chars() {
        let part = match c {
            '0'..='9' => {
                num.push(c);
                continue;
            }
            'h' => num
                .parse::<u32>()
                .map_err(|_| "Invalid hours")?
                .checked_mul(60),
            'm' => Some(num.parse::<u32>().map_err(|_| "Invalid minutes")?),
            _ => return Err("Invalid format (use e.g. 25, 25m, 1h30m)".into()),
        };
        total = part
            .and_then(|p| total.checked_add(p))
            .ok_or("Duration too long")?;
        num.clear();
    }
    if !num.is_empty() {
        return Err("Missing unit after number".into());
    }

    check_minutes(total)
}

fn check_minutes(total: u32) -> Result<u32, String> {
    match total {
        0 => Err("Duration must be > 0".into()),
        t if t > MAX_MINUTES => Err("Duration too long (max 24h)".into()),
        t => Ok(t),
    }
}
