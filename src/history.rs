//! Focus history: minutes of completed focus per calendar day, and the
//! trailing heatmap grid built from it.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HEATMAP_WEEKS: u32 = 16;
pub const MAX_HEATMAP_WEEKS: u32 = 52;

/// Append-only day → minutes counter. Entries are never decremented.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct History {
    days: BTreeMap<NaiveDate, u32>,
}

impl History {
    pub fn record_session(&mut self, date: NaiveDate, minutes: u32) -> u32 {
        let entry = self.days.entry(date).or_insert(0);
        *entry = entry.saturating_add(minutes);
        *entry
    }

    pub fn minutes_on(&self, date: NaiveDate) -> u32 {
        self.days.get(&date).copied().unwrap_or(0)
    }

    pub fn total_minutes(&self) -> u64 {
        self.days.values().map(|&m| m as u64).sum()
    }

    pub fn active_days(&self) -> usize {
        self.days.values().filter(|&&m| m > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &u32)> {
        self.days.iter()
    }

    pub fn heatmap(&self, today: NaiveDate, weeks: u32) -> Heatmap {
        Heatmap::build(self, today, weeks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intensity {
    Empty,
    Lightest,
    Light,
    Medium,
    Darkest,
}

impl Intensity {
    pub const ALL: [Intensity; 5] = [
        Intensity::Empty,
        Intensity::Lightest,
        Intensity::Light,
        Intensity::Medium,
        Intensity::Darkest,
    ];

    pub fn for_minutes(minutes: u32) -> Self {
        match minutes {
            0 => Self::Empty,
            1..=29 => Self::Lightest,
            30..=59 => Self::Light,
            60..=119 => Self::Medium,
            _ => Self::Darkest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub minutes: u32,
    pub intensity: Intensity,
    /// Days after today in the final column; rendered blank.
    pub upcoming: bool,
}

/// Calendar grid of `weeks` columns by 7 rows (Sunday first). The last
/// column is the week containing today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heatmap {
    pub columns: Vec<[HeatCell; 7]>,
}

impl Heatmap {
    pub fn build(history: &History, today: NaiveDate, weeks: u32) -> Self {
        let weeks = weeks.clamp(1, MAX_HEATMAP_WEEKS);
        let offset = today.weekday().num_days_from_sunday() as u64;
        let start = today
            .checked_sub_days(Days::new(offset + 7 * (weeks as u64 - 1)))
            .unwrap_or(today);

        let columns = (0..weeks as u64)
            .map(|w| {
                std::array::from_fn(|d| {
                    let date = start
                        .checked_add_days(Days::new(w * 7 + d as u64))
                        .unwrap_or(today);
                    let minutes = history.minutes_on(date);
                    HeatCell {
                        date,
                        minutes,
                        intensity: Intensity::for_minutes(minutes),
                        upcoming: date > today,
                    }
                })
            })
            .collect();

        Self { columns }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.columns.first().map(|c| c[0].date)
    }

    /// Row `d` (0 = Sunday) across all columns.
    pub fn row(&self, d: usize) -> impl Iterator<Item = &HeatCell> {
        self.columns.iter().map(move |c| &c[d % 7])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sessions_on_the_same_day_accumulate() {
        let mut history = History::default();
        history.record_session(day("2024-06-01"), 25);
        assert_eq!(history.record_session(day("2024-06-01"), 25), 50);
        assert_eq!(history.minutes_on(day("2024-06-01")), 50);

        history.record_session(day("2024-06-02"), 25);
        assert_eq!(history.minutes_on(day("2024-06-02")), 25);
        assert_eq!(history.minutes_on(day("2024-06-01")), 50);
        assert_eq!(history.total_minutes(), 75);
        assert_eq!(history.active_days(), 2);
    }

    #[test]
    fn intensity_tiers() {
        assert_eq!(Intensity::for_minutes(0), Intensity::Empty);
        assert_eq!(Intensity::for_minutes(29), Intensity::Lightest);
        assert_eq!(Intensity::for_minutes(30), Intensity::Light);
        assert_eq!(Intensity::for_minutes(59), Intensity::Light);
        assert_eq!(Intensity::for_minutes(60), Intensity::Medium);
        assert_eq!(Intensity::for_minutes(119), Intensity::Medium);
        assert_eq!(Intensity::for_minutes(120), Intensity::Darkest);
    }

    #[test]
    fn grid_starts_on_sunday_and_ends_in_this_week() {
        // 2024-06-05 is a Wednesday.
        let today = day("2024-06-05");
        let grid = History::default().heatmap(today, 4);

        assert_eq!(grid.columns.len(), 4);
        let first = grid.first_day().unwrap();
        assert_eq!(first.weekday(), Weekday::Sun);
        assert_eq!(first, day("2024-05-12"));

        let last = grid.columns.last().unwrap();
        assert_eq!(last[3].date, today);
        assert!(!last[3].upcoming);
        assert!(last[4].upcoming && last[6].upcoming);
        assert_eq!(last[6].date, day("2024-06-08"));
    }

    #[test]
    fn grid_is_contiguous() {
        let grid = History::default().heatmap(day("2024-01-01"), 16);
        let dates: Vec<NaiveDate> = grid.columns.iter().flat_map(|c| c.iter().map(|h| h.date)).collect();
        assert_eq!(dates.len(), 16 * 7);
        for pair in dates.windows(2) {
            assert_eq!(pair[1], pair[0].succ_opt().unwrap());
        }
    }

    #[test]
    fn grid_width_is_bounded() {
        let today = day("2024-06-05");
        assert_eq!(History::default().heatmap(today, 0).columns.len(), 1);
        assert_eq!(
            History::default().heatmap(today, u32::MAX).columns.len(),
            MAX_HEATMAP_WEEKS as usize
        );
    }

    #[test]
    fn grid_cells_carry_minutes_and_tier() {
        let today = day("2024-06-08");
        let mut history = History::default();
        history.record_session(today, 125);
        history.record_session(day("2024-06-02"), 25);

        let grid = history.heatmap(today, 2);
        let last = grid.columns.last().unwrap();
        assert_eq!(last[0].minutes, 25);
        assert_eq!(last[0].intensity, Intensity::Lightest);
        assert_eq!(last[6].minutes, 125);
        assert_eq!(last[6].intensity, Intensity::Darkest);
        assert!(grid.row(6).all(|c| !c.upcoming));
    }

    #[test]
    fn history_json_is_a_date_keyed_object() {
        let mut history = History::default();
        history.record_session(day("2024-06-01"), 50);
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"{"2024-06-01":50}"#);

        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
