use std::time::{Duration, Instant};

/// Averages frames per second over a fixed reporting period.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    period: Duration,
    since: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, Instant::now())
    }

    pub fn starting_at(period: Duration, since: Instant) -> Self {
        Self {
            period,
            since,
            frames: 0,
        }
    }

    /// Counts a frame presented at `now`.
    ///
    /// Returns the average rate once more than one period has elapsed, then
    /// starts a new period.
    pub fn frame(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed <= self.period {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.since = now;
        self.frames = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_period() {
        let t0 = Instant::now();
        let mut f = FpsCounter::starting_at(Duration::from_secs(5), t0);

        for i in 1..300 {
            assert_eq!(f.frame(t0 + Duration::from_millis(i * 10)), None);
        }
        let fps = f.frame(t0 + Duration::from_millis(6000)).unwrap();
        assert!((fps - 50.0).abs() < 1e-3);

        assert_eq!(f.frame(t0 + Duration::from_millis(6010)), None);
    }
}
