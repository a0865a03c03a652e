//! Fixed-period recurring task.
//!
//! A `RecurringTask` holds no callback; it only knows when its next tick is
//! due. The dashboard asks each task for due ticks and runs them itself, so
//! stopping a task can only prevent future ticks, never interrupt one.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTask {
    period: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl RecurringTask {
    /// A stopped task. Non-positive periods are raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::milliseconds(1)),
            next_due: None,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::milliseconds(i64::try_from(millis).unwrap_or(i64::MAX / 2)))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Schedules the first tick one period after `now`, replacing any
    /// schedule already in place. A first tick past the representable date
    /// range leaves the task stopped.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = now.checked_add_signed(self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// If a tick is due at or before `now`, consumes it and returns its
    /// scheduled instant. Call repeatedly to catch up on missed ticks.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let due = self.next_due.filter(|due| *due <= now)?;
        self.next_due = due.checked_add_signed(self.period);
        Some(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_new_task_is_idle() {
        let mut task = RecurringTask::from_millis(3_000);
        assert!(!task.is_running());
        assert_eq!(task.take_due(t0() + Duration::hours(1)), None);
    }

    #[test]
    fn test_first_tick_is_one_period_after_start() {
        let mut task = RecurringTask::from_millis(3_000);
        task.start(t0());
        assert_eq!(task.take_due(t0() + Duration::milliseconds(2_999)), None);
        assert_eq!(
            task.take_due(t0() + Duration::milliseconds(3_000)),
            Some(t0() + Duration::milliseconds(3_000))
        );
    }

    #[test]
    fn test_catch_up_yields_each_missed_tick_in_order() {
        let mut task = RecurringTask::from_millis(500);
        task.start(t0());
        let now = t0() + Duration::milliseconds(1_600);
        let mut ticks = Vec::new();
        while let Some(due) = task.take_due(now) {
            ticks.push((due - t0()).num_milliseconds());
        }
        assert_eq!(ticks, vec![500, 1_000, 1_500]);
    }

    #[test]
    fn test_restart_replaces_previous_schedule() {
        let mut task = RecurringTask::from_millis(3_000);
        task.start(t0());
        task.start(t0() + Duration::milliseconds(2_000));
        assert_eq!(task.next_due(), Some(t0() + Duration::milliseconds(5_000)));
    }

    #[test]
    fn test_stop_prevents_future_ticks() {
        let mut task = RecurringTask::from_millis(500);
        task.start(t0());
        task.stop();
        assert!(!task.is_running());
        assert_eq!(task.take_due(t0() + Duration::seconds(10)), None);
    }

    #[test]
    fn test_huge_period_does_not_panic_on_start() {
        let mut task = RecurringTask::from_millis(u64::MAX);
        task.start(t0());
        assert!(!task.is_running());
        assert_eq!(task.take_due(t0() + Duration::days(365)), None);
    }

    #[test]
    fn test_last_representable_tick_is_still_delivered() {
        let end = DateTime::<Utc>::MAX_UTC;
        let mut task = RecurringTask::from_millis(1_000);
        task.start(end - Duration::milliseconds(1_500));
        assert_eq!(task.take_due(end), Some(end - Duration::milliseconds(500)));
        assert!(!task.is_running());
    }
}
