// used for the simulated time
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub const DATE_FORMAT: &str = "%Y/%m/%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Simulated time. It only moves when told to, never with the wall clock.
#[derive(Debug, Clone)]
pub struct Clock {
    now: NaiveDateTime,
}

impl Clock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { now: start }
    }
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }
    /// Moves the clock forward and returns the instant it left.
    pub fn advance(&mut self, days: i64, hours: i64) -> NaiveDateTime {
        let before = self.now;
        self.now += Duration::days(days) + Duration::hours(hours);
        before
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Durations print as hh:mm:ss, hours may exceed 24.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn advance_moves_by_days_and_hours() {
        let mut clock = Clock::new(at(1, 10));
        let before = clock.advance(5, 3);
        assert_eq!(before, at(1, 10));
        assert_eq!(clock.now(), at(6, 13));
    }

    #[test]
    fn durations_keep_whole_hours() {
        assert_eq!(format_duration(Duration::minutes(90)), "01:30:00");
        assert_eq!(format_duration(Duration::hours(26) + Duration::seconds(5)), "26:00:05");
        assert_eq!(format_duration(Duration::seconds(-4)), "00:00:00");
    }
}
