//! Injectable clock for deterministic timing in tests. Workflow code that
//! needs "now" for anything a checkpoint or replay test asserts against
//! should take a clock rather than reading the wall clock directly.

use std::time::Duration;

/// A fake clock driven by explicit `advance_*` calls instead of real time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now_secs: u64,
}

impl MockClock {
    #[must_use]
    pub fn new(start_secs: u64) -> Self {
        Self { now_secs: start_secs }
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        self.now_secs
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.now_secs += secs;
    }

    #[must_use]
    pub fn has_elapsed(&self, since_secs: u64, duration: Duration) -> bool {
        self.now_secs.saturating_sub(since_secs) >= duration.as_secs()
    }
}

pub mod time_utils {
    use chrono::{DateTime, Utc};

    /// Formats a Unix timestamp (seconds) as RFC 3339, for log lines and
    /// audit trail details that need a human-readable time.
    #[must_use]
    pub fn format_timestamp(unix_secs: i64) -> String {
        DateTime::<Utc>::from_timestamp(unix_secs, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "invalid-timestamp".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_advances_and_reports_elapsed() {
        let mut clock = MockClock::new(1000);
        assert_eq!(clock.now(), 1000);
        clock.advance_secs(10);
        assert!(clock.has_elapsed(1000, Duration::from_secs(10)));
        assert!(!clock.has_elapsed(1000, Duration::from_secs(11)));
    }

    #[test]
    fn formats_epoch_as_1970() {
        assert!(time_utils::format_timestamp(0).contains("1970"));
    }
}
