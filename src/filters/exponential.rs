use super::ScoreFilter;

/// Exponential smoothing filter.
///
/// The accumulator starts at zero, so a fresh session ramps up towards the
/// first raw scores instead of jumping straight to them.
pub struct ExponentialFilter {
    alpha: f64,
    state: f64,
}

impl ExponentialFilter {
    /// Create a new exponential filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, state: 0.0 }
    }

    /// Current accumulator value
    #[must_use]
    pub const fn state(&self) -> f64 {
        self.state
    }
}

impl ScoreFilter for ExponentialFilter {
    fn apply(&mut self, value: f64) -> f64 {
        self.state = self.alpha.mul_add(value - self.state, self.state);
        self.state
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
