use async_trait::async_trait;
use jiff::Timestamp;
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
    /// Suspend until the clock reaches the target time.
    async fn wait_until(&self, target: Timestamp);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    async fn wait_until(&self, target: Timestamp) {
        // Re-check after every sleep; timers may fire early.
        loop {
            let now = Timestamp::now();
            if now >= target {
                return;
            }
            // 1 ms floor avoids spinning on sub-millisecond gaps.
            let remaining = Duration::try_from(target.duration_since(now))
                .unwrap_or_default()
                .max(Duration::from_millis(1));
            tokio::time::sleep(remaining).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use crate::clock::Clock;
    use async_trait::async_trait;
    use jiff::Timestamp;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    pub(crate) struct TestClock {
        inner: Arc<Mutex<TestClockState>>,
    }

    struct TestClockState {
        now: Timestamp,
    }

    impl TestClock {
        pub(crate) fn new(now: Timestamp) -> Self {
            Self {
                inner: Arc::new(Mutex::new(TestClockState { now })),
            }
        }

        /// Moves the clock to `now`, backwards or forwards.
        pub(crate) fn set(&self, now: Timestamp) {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .now = now;
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .now
        }

        async fn wait_until(&self, target: Timestamp) {
            let mut state = self
                .inner
                .lock()
                .expect("test clock lock should not be poisoned");
            // advance instead of sleeping
            if target > state.now {
                state.now = target;
            }
        }
    }

    #[tokio::test]
    async fn test_clock_works() {
        let base = Timestamp::from_second(0).unwrap();
        let clock = TestClock::new(base);
        assert_eq!(clock.now(), base);

        let target = Timestamp::from_second(1000).unwrap();
        clock.wait_until(target).await;
        assert_eq!(clock.now(), target);

        clock.set(base);
        assert_eq!(clock.now(), base);
    }
}
