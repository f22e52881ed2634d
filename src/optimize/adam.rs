//! ## Notice
//!
//! The module was adapted from the [source code of Burn v0.14.0](
//! https://github.com/tracel-ai/burn/blob/v0.14.0/crates/burn-core/src/optim/adam.rs).
//!
//! ## License
//!
//! MIT License
//!
//! Copyright (c) 2022 Nathaniel Simard & Burn Framework Contributors

pub use super::*;

/// Adam optimizer as described in the paper:
/// ["Adam: A Method for Stochastic Optimization"](https://arxiv.org/pdf/1412.6980.pdf).
#[derive(Clone, Debug)]
pub struct Adam<AB: AutodiffBackend, const D: usize> {
    pub config: AdamConfig,
    pub record: AdamRecord<AB::InnerBackend, D>,
}

#[derive(Config, Copy, Debug, PartialEq)]
pub struct AdamConfig {
    /// The coefficient used for computing running average of gradient.
    #[config(default = "0.9")]
    pub beta_1: f64,

    /// The coefficient used for computing running average of squared gradient.
    #[config(default = "0.999")]
    pub beta_2: f64,

    /// A value added to the denominator to improve numerical stability.
    #[config(default = "1e-8")]
    pub epsilon: f64,

    /// L2 penalty.
    pub weight_decay: Option<f64>,
}

pub type AdamRecord<B, const D: usize> = Option<AdamState<B, D>>;

#[derive(Clone, Debug, Record)]
pub struct AdamState<B: Backend, const D: usize> {
    pub moment_1: Tensor<B, D>,
    pub moment_2: Tensor<B, D>,
    pub time: i32,
}

impl AdamConfig {
    pub fn init<AB: AutodiffBackend, const D: usize>(self) -> Adam<AB, D> {
        Adam {
            config: self,
            record: None,
        }
    }
}

impl<AB: AutodiffBackend, const D: usize> Adam<AB, D> {
    pub fn update(
        &mut self,
        learning_rate: f64,
        value: Tensor<AB, D>,
        mut grad: Tensor<AB::InnerBackend, D>,
    ) -> Tensor<AB, D> {
        let value = value.inner();

        if let Some(weight_decay) = self.config.weight_decay {
            grad = grad + value.to_owned().mul_scalar(weight_decay);
        }

        let mut moment_1 = grad.to_owned().mul_scalar(1.0 - self.config.beta_1);
        let mut moment_2 = (grad.to_owned() * grad).mul_scalar(1.0 - self.config.beta_2);
        let mut time = 1;

        if let Some(record) = self.record.take() {
            moment_1 = moment_1 + record.moment_1.mul_scalar(self.config.beta_1);
            moment_2 = moment_2 + record.moment_2.mul_scalar(self.config.beta_2);
            time += record.time;
        }

        let moment_1_corrected =
            moment_1.to_owned().div_scalar(1.0 - self.config.beta_1.powi(time));
        let moment_2_corrected =
            moment_2.to_owned().div_scalar(1.0 - self.config.beta_2.powi(time));
        let grad_corrected = moment_1_corrected
            / moment_2_corrected.sqrt().add_scalar(self.config.epsilon);

        self.record = Some(AdamState {
            moment_1,
            moment_2,
            time,
        });

        let value = value - grad_corrected.mul_scalar(learning_rate);

        Tensor::from_inner(value).require_grad()
    }
}

impl<AB: AutodiffBackend, const D: usize> Default for Adam<AB, D> {
    #[inline]
    fn default() -> Self {
        AdamConfig::default().init()
    }
}

impl Default for AdamConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
