use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Timestamp stamped on queue entries.
    fn now(&self) -> DateTime<Utc>;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same day, frozen at midnight UTC.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn now(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }
}
