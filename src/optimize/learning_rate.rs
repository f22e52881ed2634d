pub use burn::{config::Config, record::Record};

use std::ops::{Deref, Mul};

/// A learning rate decayed by `gamma` every `step_size` updates.
#[derive(Clone, Debug)]
pub struct LearningRate {
    pub config: LearningRateConfig,
    pub record: LearningRateRecord,
}

/// A learning rate decayed by `gamma` every `step_size` updates.
///
/// A zero `step_size` keeps the learning rate constant.
#[derive(Config, Copy, Debug, PartialEq)]
pub struct LearningRateConfig {
    #[config(default = "0.5")]
    pub gamma: f64,

    pub start: f64,

    #[config(default = "20000")]
    pub step_size: u64,
}

#[derive(Clone, Debug, Record)]
pub struct LearningRateRecord {
    pub current: f64,
    pub time: u64,
}

impl LearningRate {
    /// `lr = start * gamma ^ floor(time / step_size)`
    pub fn update(&mut self) -> &mut Self {
        self.record.time += 1;

        if self.config.step_size != 0 && self.record.time % self.config.step_size == 0 {
            self.record.current = self.record.current.mul(self.config.gamma);

            #[cfg(all(debug_assertions, not(test)))]
            log::debug!(
                target: "gausplat::basis::optimize",
                "learning_rate > {} (time {})",
                self.record.current,
                self.record.time,
            );
        }

        self
    }

    #[inline]
    pub fn load_record(
        &mut self,
        record: LearningRateRecord,
    ) -> &mut Self {
        self.record = record;
        self
    }

    #[inline]
    pub fn into_record(self) -> LearningRateRecord {
        self.record
    }
}

impl LearningRateConfig {
    pub fn init(&self) -> LearningRate {
        LearningRate {
            config: *self,
            record: LearningRateRecord {
                current: self.start,
                time: 0,
            },
        }
    }
}

impl Default for LearningRate {
    #[inline]
    fn default() -> Self {
        LearningRateConfig::default().init()
    }
}

impl Default for LearningRateConfig {
    #[inline]
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl Deref for LearningRate {
    type Target = f64;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.record.current
    }
}

impl From<f64> for LearningRateConfig {
    #[inline]
    fn from(start: f64) -> Self {
        Self::new(start)
    }
}

impl From<f64> for LearningRate {
    #[inline]
    fn from(start: f64) -> Self {
        LearningRateConfig::from(start).init()
    }
}
