//! Adan optimizer as described in the paper:
//! ["Adan: Adaptive Nesterov Momentum Algorithm for Faster Optimizing Deep Models"](
//! https://arxiv.org/abs/2208.06677).

pub use super::*;

#[derive(Clone, Debug)]
pub struct Adan<AB: AutodiffBackend, const D: usize> {
    pub config: AdanConfig,
    pub record: AdanRecord<AB::InnerBackend, D>,
}

#[derive(Config, Copy, Debug, PartialEq)]
pub struct AdanConfig {
    /// The coefficient used for computing running average of gradient.
    #[config(default = "0.98")]
    pub beta_1: f64,

    /// The coefficient used for computing running average of gradient difference.
    #[config(default = "0.92")]
    pub beta_2: f64,

    /// The coefficient used for computing running average of squared update.
    #[config(default = "0.99")]
    pub beta_3: f64,

    /// A value added to the denominator to improve numerical stability.
    #[config(default = "1e-8")]
    pub epsilon: f64,

    /// Decoupled weight decay.
    #[config(default = "0.0")]
    pub weight_decay: f64,

    /// Applying the weight decay before the update
    /// instead of the proximal form after the update.
    #[config(default = "false")]
    pub is_weight_decay_not_proximal: bool,
}

pub type AdanRecord<B, const D: usize> = Option<AdanState<B, D>>;

#[derive(Clone, Debug, Record)]
pub struct AdanState<B: Backend, const D: usize> {
    pub grad_previous: Tensor<B, D>,
    pub moment_1: Tensor<B, D>,
    pub moment_2: Tensor<B, D>,
    pub moment_3: Tensor<B, D>,
    pub time: i32,
}

impl AdanConfig {
    pub fn init<AB: AutodiffBackend, const D: usize>(self) -> Adan<AB, D> {
        Adan {
            config: self,
            record: None,
        }
    }
}

impl<AB: AutodiffBackend, const D: usize> Adan<AB, D> {
    /// ## Details
    ///
    /// * `d = g - g'` (`0` at the first step)
    /// * `m_1 = b_1 * m_1 + (1 - b_1) * g`
    /// * `m_2 = b_2 * m_2 + (1 - b_2) * d`
    /// * `m_3 = b_3 * m_3 + (1 - b_3) * (g + b_2 * d) ^ 2`
    /// * `u = (m_1 / c_1 + b_2 * m_2 / c_2) / (sqrt(m_3 / c_3) + e)`
    ///   where `c_k = 1 - b_k ^ t`
    /// * `x = (x - l * u) / (1 + l * w)`
    pub fn update(
        &mut self,
        learning_rate: f64,
        value: Tensor<AB, D>,
        grad: Tensor<AB::InnerBackend, D>,
    ) -> Tensor<AB, D> {
        let AdanConfig {
            beta_1,
            beta_2,
            beta_3,
            epsilon,
            weight_decay,
            is_weight_decay_not_proximal,
        } = self.config;
        let mut value = value.inner();

        let record = self.record.take();
        let grad_diff = match &record {
            Some(record) => grad.to_owned() - record.grad_previous.to_owned(),
            None => grad.zeros_like(),
        };
        let grad_nesterov = grad.to_owned() + grad_diff.to_owned().mul_scalar(beta_2);

        let mut moment_1 = grad.to_owned().mul_scalar(1.0 - beta_1);
        let mut moment_2 = grad_diff.mul_scalar(1.0 - beta_2);
        let mut moment_3 =
            (grad_nesterov.to_owned() * grad_nesterov).mul_scalar(1.0 - beta_3);
        let mut time = 1;

        if let Some(record) = record {
            moment_1 = moment_1 + record.moment_1.mul_scalar(beta_1);
            moment_2 = moment_2 + record.moment_2.mul_scalar(beta_2);
            moment_3 = moment_3 + record.moment_3.mul_scalar(beta_3);
            time += record.time;
        }

        let correction_1 = 1.0 - beta_1.powi(time);
        let correction_2 = 1.0 - beta_2.powi(time);
        let correction_3 = 1.0 - beta_3.powi(time);

        let denominator = moment_3
            .to_owned()
            .div_scalar(correction_3)
            .sqrt()
            .add_scalar(epsilon);
        let update = (moment_1.to_owned().div_scalar(correction_1)
            + moment_2.to_owned().mul_scalar(beta_2 / correction_2))
            / denominator;

        if is_weight_decay_not_proximal {
            value = value.mul_scalar(1.0 - learning_rate * weight_decay)
                - update.mul_scalar(learning_rate);
        } else {
            value = (value - update.mul_scalar(learning_rate))
                .div_scalar(1.0 + learning_rate * weight_decay);
        }

        self.record = Some(AdanState {
            grad_previous: grad,
            moment_1,
            moment_2,
            moment_3,
            time,
        });

        Tensor::from_inner(value).require_grad()
    }
}

impl<AB: AutodiffBackend, const D: usize> Default for Adan<AB, D> {
    #[inline]
    fn default() -> Self {
        AdanConfig::default().init()
    }
}

impl Default for AdanConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
