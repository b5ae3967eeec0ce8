/// Smooth scroll between two offsets, driven by the frame clock passed to `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tween {
    pub origin: u64,
    pub target: u64,
    pub started_at_ms: u64,
    /// Never 0.
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(
        origin: u64,
        target: u64,
        started_at_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> Self {
        Self {
            origin,
            target,
            started_at_ms,
            duration_ms: duration_ms.max(1),
            easing,
        }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        if elapsed >= self.duration_ms {
            1.0
        } else {
            elapsed as f32 / self.duration_ms as f32
        }
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) >= self.duration_ms
    }

    /// Offset at `now_ms`; exactly `target` once the tween is done.
    pub fn sample(&self, now_ms: u64) -> u64 {
        if self.is_done(now_ms) {
            return self.target;
        }
        let eased = f64::from(self.easing.apply(self.progress(now_ms)));
        // Interpolate in i128/f64: scroll offsets past 2^24 px lose precision in f32.
        let travel = i128::from(self.target) - i128::from(self.origin);
        let offset = i128::from(self.origin) + (travel as f64 * eased) as i128;
        offset.clamp(0, i128::from(u64::MAX)) as u64
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    EaseOutCubic,
    #[default]
    EaseInOutCubic,
}

impl Easing {
    /// Maps linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let cube = |x: f32| x * x * x;
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - cube(1.0 - t),
            Easing::EaseInOutCubic if t < 0.5 => 4.0 * cube(t),
            Easing::EaseInOutCubic => 1.0 - cube(2.0 - 2.0 * t) / 2.0,
        }
    }
}
