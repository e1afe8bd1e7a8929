use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::clock::{format_date, format_duration};
use crate::library::Library;

/// Library statistics, optionally narrowed to one month of the current year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub date: NaiveDate,
    pub books: u64,
    pub visitors: usize,
    pub average_visit: Duration,
    pub books_purchased: u64,
    pub fines_collected: u64,
    pub fines_outstanding: u64,
}

impl Report {
    pub fn compile(library: &Library, month: Option<u32>) -> Self {
        let now = library.now();
        let within = |at: NaiveDateTime| match month {
            Some(m) => at.year() == now.year() && at.month() == m,
            None => true,
        };
        let visits: Vec<Duration> = library
            .visitors
            .completed()
            .iter()
            .filter(|v| within(v.end))
            .map(|v| v.duration())
            .collect();
        let average_visit = match i32::try_from(visits.len()) {
            Ok(count) if count > 0 => visits.iter().fold(Duration::zero(), |a, d| a + *d) / count,
            _ => Duration::zero(),
        };
        Self {
            date: now.date(),
            books: library.catalog.total_copies(),
            visitors: library
                .visitors
                .visitors()
                .filter(|v| within(v.registered()))
                .count(),
            average_visit,
            books_purchased: library
                .catalog
                .purchases()
                .iter()
                .filter(|p| within(p.at))
                .map(|p| u64::from(p.quantity))
                .sum(),
            fines_collected: library
                .ledger
                .payments()
                .iter()
                .filter(|p| within(p.at))
                .map(|p| p.amount)
                .sum(),
            fines_outstanding: library.ledger.total_outstanding(now),
        }
    }
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Number of Books: {}", self.books),
            format!("Number of Visitors: {}", self.visitors),
            format!("Average Length of Visit: {}", format_duration(self.average_visit)),
            format!("Number of Books Purchased: {}", self.books_purchased),
            format!("Fines Collected: {}", self.fines_collected),
            format!("Fines Outstanding: {}", self.fines_outstanding),
        ]
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format_date(self.date))?;
        for line in self.lines() {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}
