#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Upper bound on a single frame delta, e.g. after the surface was hidden.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Wall-clock source for the render loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started_at: Instant,
    last_tick: Option<Instant>,
    /// Clamped time since the previous tick.
    pub delta: Duration,
    /// Time since the clock was created.
    pub elapsed: Duration,
    /// Ticks so far.
    pub frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            last_tick: None,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frames: 0,
        }
    }

    /// Samples the wall clock. The first tick has a zero delta.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = self
            .last_tick
            .map_or(Duration::ZERO, |last| (now - last).min(MAX_FRAME_DELTA));
        self.elapsed = now - self.started_at;
        self.last_tick = Some(now);
        self.frames += 1;
        self.delta.as_secs_f32()
    }

    /// Forgets the previous tick so the next delta starts from zero.
    pub fn pause(&mut self) {
        self.last_tick = None;
    }
}
