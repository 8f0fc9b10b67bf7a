//! # Frame Clock
//!
//! Per-frame delta time and a rolling fps estimate.

use std::collections::VecDeque;
use std::time::Instant;

/// Timing for one frame, as reported to `Update` handlers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTiming {
    /// Zero-based frame index.
    pub frame: u64,
    /// Seconds since the previous frame, clamped. Zero on the first frame.
    pub dt: f64,
    /// Frames per second over the recent window. Zero until two frames
    /// have been seen.
    pub fps: f64,
}

/// Measures frame-to-frame time.
#[derive(Debug)]
pub struct FrameClock {
    /// Start of each recent frame, oldest first.
    window: VecDeque<Instant>,
    capacity: usize,
    max_delta: f64,
    frame: u64,
}

impl FrameClock {
    /// Creates a clock averaging fps over `capacity` frames and clamping
    /// `dt` to `max_delta` seconds.
    #[must_use]
    pub fn new(capacity: usize, max_delta: f64) -> Self {
        let capacity = capacity.max(2);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            max_delta,
            frame: 0,
        }
    }

    /// Starts the next frame now.
    pub fn tick(&mut self) -> FrameTiming {
        self.tick_at(Instant::now())
    }

    /// Starts the next frame at `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTiming {
        // Clamp so a stall (debugger, window drag) does not explode dt
        let dt = self
            .window
            .back()
            .map_or(0.0, |last| now.saturating_duration_since(*last).as_secs_f64())
            .min(self.max_delta);

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(now);

        let fps = match (self.window.front(), self.window.back()) {
            (Some(first), Some(last)) if self.window.len() > 1 => {
                let span = last.saturating_duration_since(*first).as_secs_f64();
                if span > 0.0 {
                    #[allow(clippy::cast_precision_loss)]
                    let intervals = (self.window.len() - 1) as f64;
                    intervals / span
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let timing = FrameTiming {
            frame: self.frame,
            dt,
            fps,
        };
        self.frame += 1;
        timing
    }

    /// Number of frames started so far.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frame
    }
}
