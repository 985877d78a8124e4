use crate::utils::FrameClock;

/// Cancelable per-frame driver.
///
/// The host calls [`RenderLoop::next_frame`] from its animation callback and
/// stops scheduling once it returns `None`. Cancellation is permanent.
#[derive(Debug, Default)]
pub struct RenderLoop {
    running: bool,
    cancelled: bool,
    clock: FrameClock,
}

impl RenderLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.cancelled || self.running {
            return;
        }
        self.clock.pause();
        self.running = true;
        log::debug!("Render loop started");
    }

    /// Returns the frame delta in seconds, or `None` when the loop is stopped.
    pub fn next_frame(&mut self) -> Option<f32> {
        self.running.then(|| self.clock.tick())
    }

    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.running = false;
            self.cancelled = true;
            log::debug!("Render loop cancelled after {} frame(s)", self.clock.frames);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.clock.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_permanent() {
        let mut render_loop = RenderLoop::new();
        assert!(render_loop.next_frame().is_none());
        render_loop.start();
        assert!(render_loop.is_running());
        assert!(render_loop.next_frame().is_some());
        render_loop.cancel();
        render_loop.start();
        assert!(!render_loop.is_running());
        assert!(render_loop.next_frame().is_none());
        assert_eq!(render_loop.frames(), 1);
    }
}
