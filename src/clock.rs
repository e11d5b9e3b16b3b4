use super::drug::TimeStamp;
use chrono::Utc;

pub trait Clock {
    fn now(&self) -> TimeStamp<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeStamp<Utc> {
        TimeStamp::new()
    }
}

/// Always reports the same instant, keeps history rows reproducible.
#[derive(Debug, Clone)]
pub struct FixedClock(pub TimeStamp<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> TimeStamp<Utc> {
        self.0.clone()
    }
}
