//! Daily announcement scheduler
//!
//! An independent loop, decoupled from the command cycle: it wakes at a
//! short fixed interval, checks the wall clock against a daily window, and
//! fires a scripted announcement at most once per calendar day through the
//! shared speech sink.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::command::spoken_time;
use crate::config::ScheduleConfig;
use crate::speech::SpeechHandle;

/// Once-per-day firing state
///
/// Tracking the calendar date of the last firing makes the early-morning
/// reset implicit: a new date re-arms the scheduler regardless of when the
/// process started.
#[derive(Debug, Default)]
pub struct ScheduleState {
    fired_on: Option<NaiveDate>,
}

impl ScheduleState {
    /// Whether the announcement should fire at `date`/`hour` for the given
    /// `[start, end)` window
    #[must_use]
    pub fn should_fire(&self, date: NaiveDate, hour: u32, start: u32, end: u32) -> bool {
        hour >= start && hour < end && self.fired_on != Some(date)
    }

    /// Suppress further firings until the next calendar day
    pub fn mark_fired(&mut self, date: NaiveDate) {
        self.fired_on = Some(date);
    }
}

/// On-disk shape of the daily-text cache: `{"date": "YYYY-MM-DD", "text": …}`
#[derive(Debug, Serialize, Deserialize)]
struct DailyText {
    date: NaiveDate,
    text: String,
}

/// The once-per-day announcement text, cached so it is generated at most
/// once per calendar day
#[must_use]
pub fn daily_text(path: &Path, today: NaiveDate) -> String {
    if let Some(cached) = read_daily_text(path) {
        if cached.date == today {
            return cached.text;
        }
    }

    let text = format!(
        "Today is {}, {} {}.",
        weekday_name(today),
        month_name(today),
        today.day()
    );

    let entry = DailyText {
        date: today,
        text: text.clone(),
    };
    let result = serde_json::to_string(&entry)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(path, json));
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "daily text cache write failed");
    }

    text
}

fn read_daily_text(path: &Path) -> Option<DailyText> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

fn month_name(date: NaiveDate) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    MONTHS[date.month0() as usize]
}

/// Spawn the scheduler loop; runs for the process lifetime
pub fn spawn(
    speech: SpeechHandle,
    config: ScheduleConfig,
    daily_text_path: PathBuf,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut state = ScheduleState::default();
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            window_start = config.window_start_hour,
            window_end = config.window_end_hour,
            "scheduler started"
        );

        loop {
            ticker.tick().await;

            let now = Local::now();
            let today = now.date_naive();
            if state.should_fire(
                today,
                now.hour(),
                config.window_start_hour,
                config.window_end_hour,
            ) {
                tracing::info!(date = %today, "firing daily announcement");
                speech.say("Good morning.").await;
                speech.say(daily_text(&daily_text_path, today)).await;
                speech.say(spoken_time(now.time())).await;
                state.mark_fired(today);
            }
        }
    })
}
