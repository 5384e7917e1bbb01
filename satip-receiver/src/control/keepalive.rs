//! Keepalive interval negotiation and scheduling.

use std::time::{Duration, Instant};

/// Interval used when the server does not announce a session timeout. RTSP
/// sessions expire after 60 seconds by default.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(55);
/// How long before the server-side timeout a keepalive is sent.
const MARGIN_SECS: u64 = 5;
/// Smallest interval, for servers announcing very short timeouts.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Derives the keepalive interval from the `timeout` parameter of the
/// `Session` header. `None` means keepalive is disabled.
pub fn interval(timeout: Option<u64>) -> Option<Duration> {
    match timeout {
        None => Some(DEFAULT_INTERVAL),
        Some(0) => None,
        Some(timeout) if timeout > MARGIN_SECS => Some(Duration::from_secs(timeout - MARGIN_SECS)),
        Some(_) => Some(MIN_INTERVAL),
    }
}

#[derive(Debug, Clone)]
pub struct Schedule {
    interval: Option<Duration>,
    deadline: Option<Instant>,
}

impl Schedule {
    pub fn new(interval: Option<Duration>, now: Instant) -> Self {
        Self {
            interval,
            deadline: interval.map(|interval| now + interval),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn reschedule(&mut self, now: Instant) {
        self.deadline = self.interval.map(|interval| now + interval);
    }
}

#[cfg(test)]
mod tests {

    use std::time::{Duration, Instant};

    use super::{interval, Schedule};

    #[test]
    fn interval_leaves_margin() {
        assert_eq!(interval(Some(12)), Some(Duration::from_secs(7)));
        assert_eq!(interval(Some(60)), Some(Duration::from_secs(55)));
        assert_eq!(interval(Some(6)), Some(Duration::from_secs(1)));
    }

    #[test]
    fn short_timeouts_use_minimum() {
        assert_eq!(interval(Some(3)), Some(Duration::from_secs(1)));
        assert_eq!(interval(Some(5)), Some(Duration::from_secs(1)));
        assert_eq!(interval(Some(1)), Some(Duration::from_secs(1)));
    }

    #[test]
    fn absent_timeout_uses_default() {
        assert_eq!(interval(None), Some(Duration::from_secs(55)));
    }

    #[test]
    fn zero_timeout_disables() {
        assert_eq!(interval(Some(0)), None);
        let schedule = Schedule::new(None, Instant::now());
        assert!(!schedule.is_due(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn schedule_fires_and_reschedules() {
        let start = Instant::now();
        let mut schedule = Schedule::new(Some(Duration::from_secs(7)), start);
        assert!(!schedule.is_due(start + Duration::from_secs(6)));
        assert!(schedule.is_due(start + Duration::from_secs(7)));

        schedule.reschedule(start + Duration::from_secs(7));
        assert!(!schedule.is_due(start + Duration::from_secs(13)));
        assert!(schedule.is_due(start + Duration::from_secs(14)));
    }
}
