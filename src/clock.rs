use chrono::{Datelike, Local, NaiveDate};

/// Source of "today" for project-code normalization and the naming date token.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Four-digit year, e.g. `2020`.
    fn year(&self) -> String {
        format!("{:04}", self.today().year())
    }

    /// Two-digit month followed by two-digit day, e.g. `1231`.
    fn month_day(&self) -> String {
        self.today().format("%m%d").to_string()
    }
}

/// Local wall-clock date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
