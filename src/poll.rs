//! Periodic poll wrapper around the gesture engine.

use log::debug;

use crate::config::Tuning;
use crate::engine::{Gesture, GestureEngine};
use crate::source::SampleSource;

/// Rate-limits hardware polls and skips the engine pipeline entirely while
/// the sensor reports no gesture activity.
///
/// The last-poll timestamp is an owned field, so two pollers driving two
/// sensors never share a timer.
pub struct GesturePoller {
    engine: GestureEngine,
    interval_ms: u64,
    last_poll_ms: Option<u64>,
}

impl GesturePoller {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            engine: GestureEngine::new(tuning),
            interval_ms: tuning.poll_interval_ms,
            last_poll_ms: None,
        }
    }

    /// Call from the control loop as often as convenient; anything inside
    /// the minimum interval is a no-op with no bus traffic.
    pub fn poll<S, F>(&mut self, src: &mut S, now_ms: u64, on_gesture: F)
    where
        S: SampleSource,
        F: FnMut(Gesture),
    {
        if let Some(last) = self.last_poll_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return;
            }
        }
        self.last_poll_ms = Some(now_ms);

        let status = match src.gesture_status() {
            Ok(s) => s,
            Err(e) => {
                debug!("poll status read failed: {e}");
                return;
            }
        };
        if status.data_valid {
            self.engine.process(src, now_ms, on_gesture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::source::{DeviceStatus, GestureStatus, SourceError};

    struct CountingSource {
        data_valid: bool,
        status_queries: usize,
        drains: usize,
    }

    impl CountingSource {
        fn new(data_valid: bool) -> Self {
            Self {
                data_valid,
                status_queries: 0,
                drains: 0,
            }
        }
    }

    impl SampleSource for CountingSource {
        fn pending_samples(&mut self) -> Result<u8, SourceError> {
            self.drains += 1;
            Ok(0)
        }
        fn next_sample(&mut self) -> Result<Sample, SourceError> {
            Err(SourceError::FifoUnderrun)
        }
        fn gesture_status(&mut self) -> Result<GestureStatus, SourceError> {
            self.status_queries += 1;
            Ok(GestureStatus {
                data_valid: self.data_valid,
                fifo_overflow: false,
            })
        }
        fn device_status(&mut self) -> Result<DeviceStatus, SourceError> {
            Ok(DeviceStatus::default())
        }
        fn clear_gesture_interrupt(&mut self) -> Result<(), SourceError> {
            Ok(())
        }
    }

    #[test]
    fn polls_inside_interval_are_noops() {
        let mut poller = GesturePoller::new(&Tuning::default()); // 25 ms interval
        let mut src = CountingSource::new(false);

        poller.poll(&mut src, 0, |_| {});
        poller.poll(&mut src, 10, |_| {});
        assert_eq!(src.status_queries, 1);

        poller.poll(&mut src, 25, |_| {});
        assert_eq!(src.status_queries, 2);
    }

    #[test]
    fn no_drain_while_validity_low() {
        let mut poller = GesturePoller::new(&Tuning::default());
        let mut src = CountingSource::new(false);

        poller.poll(&mut src, 0, |_| {});
        assert_eq!(src.status_queries, 1);
        assert_eq!(src.drains, 0);

        src.data_valid = true;
        poller.poll(&mut src, 50, |_| {});
        assert_eq!(src.drains, 1);
    }

    #[test]
    fn first_poll_is_never_rate_limited() {
        let mut poller = GesturePoller::new(&Tuning::default());
        let mut src = CountingSource::new(false);
        poller.poll(&mut src, 5, |_| {});
        assert_eq!(src.status_queries, 1);
    }
}
