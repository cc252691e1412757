use log::{debug, warn};
use std::time::{Duration, Instant};

/// Timing information handed to a frame callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Zero-based frame counter
    pub index: u64,
    /// Time since the scheduler delivered its first frame
    pub elapsed: Duration,
}

/// How long a frame callback took, relative to the frame budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub work: Duration,
    pub overran: bool,
}

/// Host-side "run this callback once before the next repaint" primitive.
///
/// Callers re-request every frame; the scheduler never loops on its own.
pub trait RefreshScheduler {
    fn request_frame<F: FnOnce(FrameTick)>(&mut self, callback: F) -> FrameTiming;
}

/// Overruns reported with `warn!` before the rest drop to `debug!`
const LOUD_OVERRUNS: u64 = 5;

/// Refresh scheduler that paces frames to a fixed rate.
pub struct FixedRateScheduler {
    frame_duration: Duration,
    started: Option<Instant>,
    next_deadline: Option<Instant>,
    frame_index: u64,
    overruns: u64,
}

impl FixedRateScheduler {
    pub fn new(framerate: u32) -> Self {
        let framerate = framerate.max(1);
        Self::with_frame_duration(Duration::from_secs_f64(1.0 / framerate as f64))
    }

    pub fn with_frame_duration(frame_duration: Duration) -> Self {
        Self {
            frame_duration,
            started: None,
            next_deadline: None,
            frame_index: 0,
            overruns: 0,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Number of frames delivered so far
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// Number of frames whose callback took longer than the frame budget
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    // Only worth reporting when the target framerate is high enough to matter,
    // and only loudly for the first few; the runner summarizes the rest.
    fn report_overrun(&self, index: u64, work: Duration) {
        if self.frame_duration < Duration::from_millis(10) {
            return;
        }
        if self.overruns <= LOUD_OVERRUNS {
            warn!("Frame {} exceeded budget: {:?} > {:?}", index, work, self.frame_duration);
            if self.overruns == LOUD_OVERRUNS {
                warn!("Further frame overruns are logged at debug level");
            }
        } else {
            debug!("Frame {} exceeded budget: {:?} > {:?}", index, work, self.frame_duration);
        }
    }

    // Sleep until the next frame slot. A late frame does not try to catch up.
    fn wait_for_slot(&mut self) -> Instant {
        if let Some(deadline) = self.next_deadline {
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            }
        }
        let now = Instant::now();
        self.next_deadline = Some(now + self.frame_duration);
        now
    }
}

impl RefreshScheduler for FixedRateScheduler {
    fn request_frame<F: FnOnce(FrameTick)>(&mut self, callback: F) -> FrameTiming {
        let frame_start = self.wait_for_slot();
        let started = *self.started.get_or_insert(frame_start);

        let tick = FrameTick {
            index: self.frame_index,
            elapsed: frame_start.duration_since(started),
        };
        callback(tick);
        self.frame_index += 1;

        let work = frame_start.elapsed();
        let overran = work > self.frame_duration;
        if overran {
            self.overruns += 1;
            self.report_overrun(tick.index, work);
        }
        FrameTiming { work, overran }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_numbered_and_timed() {
        let mut scheduler = FixedRateScheduler::with_frame_duration(Duration::from_millis(2));
        let mut ticks = Vec::new();
        for _ in 0..3 {
            scheduler.request_frame(|tick| ticks.push(tick));
        }

        assert_eq!(scheduler.frames(), 3);
        assert_eq!(ticks[0].index, 0);
        assert_eq!(ticks[0].elapsed, Duration::ZERO);
        assert_eq!(ticks[2].index, 2);
        // Paced frames are at least one frame duration apart
        assert!(ticks[1].elapsed >= Duration::from_millis(2));
        assert!(ticks[2].elapsed >= ticks[1].elapsed + Duration::from_millis(2));
    }

    #[test]
    fn zero_framerate_is_treated_as_one() {
        let scheduler = FixedRateScheduler::new(0);
        assert_eq!(scheduler.frame_duration(), Duration::from_secs(1));
    }

    #[test]
    fn slow_callback_reports_overrun() {
        let mut scheduler = FixedRateScheduler::with_frame_duration(Duration::from_millis(1));
        let timing = scheduler.request_frame(|_| std::thread::sleep(Duration::from_millis(5)));
        assert!(timing.overran);
        assert!(timing.work >= Duration::from_millis(5));
        assert_eq!(scheduler.overruns(), 1);
    }

    #[test]
    fn overruns_keep_counting_past_the_loud_ones() {
        let mut scheduler = FixedRateScheduler::with_frame_duration(Duration::from_millis(10));
        for _ in 0..(LOUD_OVERRUNS + 3) {
            scheduler.request_frame(|_| std::thread::sleep(Duration::from_millis(12)));
        }
        scheduler.request_frame(|_| {});
        assert_eq!(scheduler.overruns(), LOUD_OVERRUNS + 3);
        assert_eq!(scheduler.frames(), LOUD_OVERRUNS + 4);
    }
}
