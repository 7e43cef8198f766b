//! Time source and upstream call pacing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::RateLimit;

/// Wall clock plus an async sleep, injectable so tests never wait.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspends for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by the system time and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// The kind of upstream call about to be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Region bounds/centroid lookup.
    RegionInfo,
    /// Region hotspot listing.
    Hotspots,
}

/// Enforces a minimum spacing between consecutive upstream calls.
///
/// The spacing depends on the kind of the call about to be made and is
/// measured from the previous call, whatever its kind. The first call is
/// never delayed.
pub struct Pacer {
    clock: Arc<dyn Clock>,
    rate_limit: RateLimit,
    last_call: Option<DateTime<Utc>>,
}

impl Pacer {
    /// Creates a pacer that has not made any call yet.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, rate_limit: RateLimit) -> Self {
        Self {
            clock,
            rate_limit,
            last_call: None,
        }
    }

    /// Waits until a call of `kind` may be made, then records it as made.
    pub async fn pace(&mut self, kind: CallKind) {
        let spacing = match kind {
            CallKind::RegionInfo => self.rate_limit.region_delay(),
            CallKind::Hotspots => self.rate_limit.hotspot_delay(),
        };

        if let Some(last) = self.last_call {
            let elapsed = (self.clock.now() - last).to_std().unwrap_or(Duration::ZERO);
            if let Some(remaining) = spacing.checked_sub(elapsed)
                && !remaining.is_zero()
            {
                log::debug!("Pacing {kind:?} call: sleeping {remaining:?}");
                self.clock.sleep(remaining).await;
            }
        }

        self.last_call = Some(self.clock.now());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// A clock whose time only advances when something sleeps on it.
    pub struct FakeClock {
        state: Mutex<(DateTime<Utc>, Vec<Duration>)>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                state: Mutex::new((
                    DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                    Vec::new(),
                )),
            }
        }

        pub fn advance(&self, duration: Duration) {
            let mut state = self.state.lock().unwrap();
            state.0 += chrono::Duration::from_std(duration).unwrap();
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.state.lock().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            self.state.lock().unwrap().0
        }

        async fn sleep(&self, duration: Duration) {
            let mut state = self.state.lock().unwrap();
            state.1.push(duration);
            state.0 += chrono::Duration::from_std(duration).unwrap();
        }
    }

    fn rate_limit() -> RateLimit {
        RateLimit {
            hotspot_delay_ms: 1000,
            region_delay_ms: 3000,
        }
    }

    #[tokio::test]
    async fn first_call_is_not_delayed() {
        let clock = Arc::new(FakeClock::new());
        let mut pacer = Pacer::new(clock.clone(), rate_limit());
        pacer.pace(CallKind::RegionInfo).await;
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn spacing_depends_on_next_call_kind() {
        let clock = Arc::new(FakeClock::new());
        let mut pacer = Pacer::new(clock.clone(), rate_limit());
        pacer.pace(CallKind::RegionInfo).await;
        pacer.pace(CallKind::Hotspots).await;
        pacer.pace(CallKind::RegionInfo).await;
        pacer.pace(CallKind::Hotspots).await;
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(3000),
                Duration::from_millis(1000),
            ]
        );
    }

    #[tokio::test]
    async fn time_spent_working_counts_toward_spacing() {
        let clock = Arc::new(FakeClock::new());
        let mut pacer = Pacer::new(clock.clone(), rate_limit());
        pacer.pace(CallKind::Hotspots).await;
        clock.advance(Duration::from_millis(2500));
        pacer.pace(CallKind::RegionInfo).await;
        clock.advance(Duration::from_millis(5000));
        pacer.pace(CallKind::Hotspots).await;
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
    }
}
