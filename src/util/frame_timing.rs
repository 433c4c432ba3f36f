use web_time::Instant;

/// Per-frame delta clock with a smoothed FPS readout.
///
/// The first call to [`tick`](Self::tick) returns zero; every later call
/// returns the seconds since the previous one. Deltas are never negative.
pub struct FrameClock {
    /// Timestamp of the previous tick, `None` before the first.
    last_tick: Option<Instant>,
    /// Seconds accumulated over all ticks.
    elapsed: f64,
    /// Smoothed FPS using exponential moving average
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0)
    smoothing: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// A clock that has not ticked yet.
    pub fn new() -> Self {
        Self {
            last_tick: None,
            elapsed: 0.0,
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Sample the clock and return the seconds since the previous sample.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// As [`tick`](Self::tick) with an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = match self.last_tick {
            // saturating: never negative
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.record(delta);
        delta
    }

    fn record(&mut self, delta: f32) {
        self.elapsed += f64::from(delta);
        if delta > 0.0 {
            let instant_fps = 1.0 / delta;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
    }

    /// Seconds summed over every delta handed out.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Get the current FPS (smoothed)
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;

    #[test]
    fn first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn later_ticks_measure_the_gap() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        let _ = clock.tick_at(start);
        let dt = clock.tick_at(start + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-6);
        assert!((clock.elapsed() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn out_of_order_timestamps_clamp_to_zero() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        let _ = clock.tick_at(start + Duration::from_millis(10));
        assert_eq!(clock.tick_at(start), 0.0);
    }

    #[test]
    fn fps_moves_toward_frame_rate() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        let _ = clock.tick_at(start);
        for i in 1..=200 {
            let _ = clock.tick_at(start + Duration::from_millis(i * 33));
        }
        assert!(clock.fps() < 40.0 && clock.fps() > 25.0);
    }
}
