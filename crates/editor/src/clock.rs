use std::time::Instant;

#[derive(Debug, Clone, Copy)]
enum Source {
    Monotonic { last: Option<Instant> },
    Fixed(f32),
}

/// Produces one non-negative delta time per tick. Never rewinds.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    max_delta: f32,
    elapsed: f64,
}

impl FrameClock {
    /// Wall-clock deltas, clamped to `max_delta` seconds. The first tick
    /// reports zero.
    pub fn monotonic(max_delta: f32) -> Self {
        Self {
            source: Source::Monotonic { last: None },
            max_delta: max_delta.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Every tick reports `dt` seconds.
    pub fn fixed(dt: f32) -> Self {
        let dt = dt.max(0.0);
        Self {
            source: Source::Fixed(dt),
            max_delta: dt,
            elapsed: 0.0,
        }
    }

    pub fn tick(&mut self) -> f32 {
        let dt = match &mut self.source {
            Source::Monotonic { last } => {
                let now = Instant::now();
                let dt = last.map_or(0.0, |prev| now.duration_since(prev).as_secs_f32());
                *last = Some(now);
                dt.min(self.max_delta)
            }
            Source::Fixed(dt) => *dt,
        };
        self.elapsed += f64::from(dt);
        dt
    }

    /// Sum of all deltas handed out.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
