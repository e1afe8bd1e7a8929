use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;

/// Represents whether the library is currently serving visitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryState {
    /// Visitors may arrive and borrow books
    Open,
    /// Arrivals and checkouts are turned away
    Closed,
}

/// Opening hours, both inclusive: open from `open_hour:00` until `close_hour:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Hours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for Hours {
    fn default() -> Self {
        Self {
            open_hour: 9,
            close_hour: 21,
        }
    }
}

impl Hours {
    pub fn state_at(&self, at: NaiveDateTime) -> LibraryState {
        let hour = at.hour();
        if self.open_hour <= hour && hour <= self.close_hour {
            LibraryState::Open
        } else {
            LibraryState::Closed
        }
    }
    pub fn is_open(&self, at: NaiveDateTime) -> bool {
        self.state_at(at) == LibraryState::Open
    }
    /// The first instant after `from` at which the library closes, if it is
    /// no later than `to`. Moving the clock across such an instant is a close
    /// transition even if both ends of the move are within opening hours.
    pub fn closing_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Option<NaiveDateTime> {
        if to <= from || (self.open_hour == 0 && self.close_hour >= 23) {
            return None;
        }
        let mut day = from.date();
        while day <= to.date() {
            // closing at midnight belongs to the next day
            let closing = match NaiveTime::from_hms_opt(self.close_hour + 1, 0, 0) {
                Some(time) => day.and_time(time),
                None => day.and_hms_opt(0, 0, 0)? + Duration::days(1),
            };
            if from < closing && closing <= to {
                return Some(closing);
            }
            day = day.succ_opt()?;
        }
        None
    }
}
