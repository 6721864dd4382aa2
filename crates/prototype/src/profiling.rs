//! # Frame Profiler
//!
//! Named section timings for the current frame. The previous frame's samples
//! stay readable while the next frame records, so a debug view can show a
//! complete frame at any time.
//!
//! ```text
//! begin_frame ── section("physics") ── section("renderer") ── end_frame
//!                                                              │
//!                                               last_frame() ◄─┘
//! ```

use std::time::{Duration, Instant};

/// One timed section of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Section name
    pub name: &'static str,
    /// Wall time spent in the section
    pub duration: Duration,
}

/// Per-frame section timings plus running totals.
#[derive(Debug, Default)]
pub struct FrameProfiler {
    current: Vec<Sample>,
    last: Vec<Sample>,
    frame_start: Option<Instant>,
    last_frame_time: Duration,
    total_frame_time: Duration,
    max_frame_time: Duration,
    frames: u64,
}

impl FrameProfiler {
    /// Creates an idle profiler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording a frame, discarding samples of an unfinished one.
    pub fn begin_frame(&mut self) {
        self.current.clear();
        self.frame_start = Some(Instant::now());
    }

    /// Runs `f` and records its duration under `name`.
    pub fn section<R>(&mut self, name: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Records a duration measured elsewhere.
    pub fn record(&mut self, name: &'static str, duration: Duration) {
        self.current.push(Sample { name, duration });
    }

    /// Finishes the frame and publishes its samples.
    pub fn end_frame(&mut self) {
        let Some(start) = self.frame_start.take() else {
            tracing::debug!("end_frame without begin_frame");
            return;
        };
        let elapsed = start.elapsed();
        std::mem::swap(&mut self.current, &mut self.last);
        self.current.clear();

        self.frames += 1;
        self.last_frame_time = elapsed;
        self.total_frame_time += elapsed;
        self.max_frame_time = self.max_frame_time.max(elapsed);
    }

    /// Samples of the last completed frame, in recording order.
    #[must_use]
    pub fn last_frame(&self) -> &[Sample] {
        &self.last
    }

    /// Wall time of the last completed frame.
    #[must_use]
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    /// Mean wall time over all completed frames.
    #[must_use]
    pub fn mean_frame_time(&self) -> Duration {
        match u32::try_from(self.frames) {
            Ok(0) => Duration::ZERO,
            Ok(frames) => self.total_frame_time / frames,
            Err(_) => Duration::from_secs_f64(self.total_frame_time.as_secs_f64() / self.frames as f64),
        }
    }

    /// Slowest completed frame.
    #[must_use]
    pub fn max_frame_time(&self) -> Duration {
        self.max_frame_time
    }

    /// Number of completed frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_publish_on_end_frame() {
        let mut profiler = FrameProfiler::new();
        profiler.begin_frame();
        let value = profiler.section("physics", || 41 + 1);
        profiler.record("renderer", Duration::from_micros(5));
        assert_eq!(value, 42);
        assert!(profiler.last_frame().is_empty());

        profiler.end_frame();
        let names: Vec<_> = profiler.last_frame().iter().map(|s| s.name).collect();
        assert_eq!(names, ["physics", "renderer"]);
        assert_eq!(profiler.frames(), 1);
        assert!(profiler.mean_frame_time() >= profiler.last_frame_time() / 2);
    }

    #[test]
    fn test_last_frame_survives_next_recording() {
        let mut profiler = FrameProfiler::new();
        profiler.begin_frame();
        profiler.record("a", Duration::from_millis(1));
        profiler.end_frame();

        profiler.begin_frame();
        profiler.record("b", Duration::from_millis(1));
        assert_eq!(profiler.last_frame()[0].name, "a");
        profiler.end_frame();
        assert_eq!(profiler.last_frame()[0].name, "b");
        assert_eq!(profiler.frames(), 2);
    }

    #[test]
    fn test_end_without_begin_is_ignored() {
        let mut profiler = FrameProfiler::new();
        profiler.end_frame();
        assert_eq!(profiler.frames(), 0);
        assert_eq!(profiler.mean_frame_time(), Duration::ZERO);
    }
}
