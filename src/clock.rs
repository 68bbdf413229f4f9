//! Wall clock and step timing

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Source of the current time; fixed in tests so metadata is predictable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }

    /// Run `f` and report how long it took, even when it fails.
    pub fn measure<T, E, F>(&self, f: F) -> (Result<T, E>, Duration)
    where
        F: FnOnce() -> Result<T, E>,
    {
        let start = Instant::now();
        let result = f();
        (result, start.elapsed())
    }
}

/// Render a duration rounded to milliseconds (`1.234s`, `56ms`)
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis >= 1000 {
        format!("{}.{:03}s", millis / 1000, millis % 1000)
    } else {
        format!("{}ms", millis)
    }
}
