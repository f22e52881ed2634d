//! Optimizers and learning rate schedulers for the parameters.

pub mod adam;
pub mod adan;
pub mod learning_rate;

pub use adam::*;
pub use adan::*;
pub use burn::{
    config::Config,
    record::Record,
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
};
pub use learning_rate::*;

#[derive(Config, Copy, Debug, PartialEq)]
pub enum OptimizerKind {
    Adam,
    Adan,
}

#[derive(Config, Copy, Debug, PartialEq)]
pub struct OptimizerConfig {
    #[config(default = "AdamConfig::new()")]
    pub adam: AdamConfig,

    #[config(default = "AdanConfig::new()")]
    pub adan: AdanConfig,

    #[config(default = "OptimizerKind::Adan")]
    pub kind: OptimizerKind,
}

/// An optimizer for a parameter.
#[derive(Clone, Debug)]
pub enum ParamOptimizer<AB: AutodiffBackend, const D: usize> {
    Adam(Adam<AB, D>),
    Adan(Adan<AB, D>),
}

impl OptimizerConfig {
    pub fn init<AB: AutodiffBackend, const D: usize>(&self) -> ParamOptimizer<AB, D> {
        match self.kind {
            OptimizerKind::Adam => ParamOptimizer::Adam(self.adam.init()),
            OptimizerKind::Adan => ParamOptimizer::Adan(self.adan.init()),
        }
    }
}

impl<AB: AutodiffBackend, const D: usize> ParamOptimizer<AB, D> {
    /// ## Arguments
    ///
    /// * `learning_rate` - The number to multiply the update by.
    /// * `value` - The value to optimize.
    /// * `grad` - The gradient of the value.
    ///
    /// ## Returns
    ///
    /// The optimized value, which requires gradients.
    #[inline]
    pub fn update(
        &mut self,
        learning_rate: f64,
        value: Tensor<AB, D>,
        grad: Tensor<AB::InnerBackend, D>,
    ) -> Tensor<AB, D> {
        match self {
            Self::Adam(optimizer) => optimizer.update(learning_rate, value, grad),
            Self::Adan(optimizer) => optimizer.update(learning_rate, value, grad),
        }
    }

    #[inline]
    pub fn kind(&self) -> OptimizerKind {
        match self {
            Self::Adam(_) => OptimizerKind::Adam,
            Self::Adan(_) => OptimizerKind::Adan,
        }
    }
}

impl Default for OptimizerConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        type AB = Autodiff<NdArray<f32>>;

        let config = OptimizerConfig::default();
        assert_eq!(config.kind, OptimizerKind::Adan);
        assert_eq!(config.init::<AB, 2>().kind(), OptimizerKind::Adan);

        let config = config.with_kind(OptimizerKind::Adam);
        assert_eq!(config.init::<AB, 3>().kind(), OptimizerKind::Adam);
    }

    #[test]
    fn update_minimizes() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        type AB = Autodiff<NdArray<f32>>;

        let device = Default::default();

        for kind in [OptimizerKind::Adam, OptimizerKind::Adan] {
            let mut optimizer = OptimizerConfig::new().with_kind(kind).init::<AB, 2>();
            let mut value = Tensor::<AB, 2>::from_floats([[1.0, -2.0], [0.5, 3.0]], &device)
                .require_grad();

            // Minimizing sum(x^2)
            for _ in 0..400 {
                let loss = (value.to_owned() * value.to_owned()).sum();
                let mut grads = loss.backward();
                let grad = value.grad_remove(&mut grads).unwrap();
                value = optimizer.update(5e-2, value, grad);
            }

            let loss = (value.to_owned() * value.to_owned()).sum().into_scalar();
            assert!(loss < 0.1, "{kind:?} loss: {loss}");
            assert!(value.is_require_grad());
        }
    }
}
