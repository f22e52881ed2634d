pub use burn::config::Config;

/// A range of iterations, `start..end` stepped by `step`.
#[derive(Config, Copy, Debug, PartialEq)]
pub struct RangeOptions {
    pub start: u64,
    pub end: u64,
    pub step: u64,
}

impl RangeOptions {
    /// Every `step` iterations from the beginning.
    #[inline]
    pub fn every(step: u64) -> Self {
        Self {
            step,
            ..Default::default()
        }
    }

    /// Never including any iteration.
    #[inline]
    pub fn never() -> Self {
        Self {
            start: 0,
            end: 0,
            step: 1,
        }
    }

    /// Checking whether the iteration falls on the range.
    ///
    /// A zero `step` is treated as `1`.
    pub fn has(
        &self,
        iteration: u64,
    ) -> bool {
        iteration >= self.start
            && iteration < self.end
            && (iteration - self.start) % self.step.max(1) == 0
    }
}

impl Default for RangeOptions {
    #[inline]
    fn default() -> Self {
        RangeOptions {
            start: 0,
            end: u64::MAX,
            step: 1,
        }
    }
}
