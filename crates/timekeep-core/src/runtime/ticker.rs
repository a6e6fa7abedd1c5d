use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// The single shared tick source.
///
/// Reports real elapsed milliseconds between ticks rather than the nominal
/// period, so a late or throttled tick still advances timers by wall time.
/// Sub-millisecond remainders are carried into the next tick.
pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
    last: Instant,
    carry: Duration,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
            last: Instant::now(),
            carry: Duration::ZERO,
        }
    }

    /// Begin ticking. Returns `false` if already ticking.
    pub fn start(&mut self) -> bool {
        if self.interval.is_some() {
            return false;
        }
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        self.last = Instant::now();
        self.carry = Duration::ZERO;
        true
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_ticking(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick and return the milliseconds since the last
    /// one. `None` when stopped.
    pub async fn next(&mut self) -> Option<u64> {
        let interval = self.interval.as_mut()?;
        interval.tick().await;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last) + self.carry;
        self.last = now;
        let ms = elapsed.as_millis() as u64;
        self.carry = elapsed - Duration::from_millis(ms);
        Some(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_is_idempotent() {
        let mut ticker = Ticker::new(Duration::from_millis(5));
        assert!(ticker.start());
        assert!(!ticker.start());
        assert!(ticker.is_ticking());
        ticker.stop();
        assert!(!ticker.is_ticking());
        assert!(ticker.start());
    }

    #[tokio::test]
    async fn reports_wall_time_between_ticks() {
        let mut ticker = Ticker::new(Duration::from_millis(5));
        assert_eq!(ticker.next().await, None);
        ticker.start();
        let mut total = 0;
        for _ in 0..4 {
            total += ticker.next().await.unwrap();
        }
        assert!(total >= 20, "only {total} ms elapsed");
    }
}
