pub use super::*;

/// The kind of loss between the rendered images and the targets.
#[derive(Config, Copy, Debug, Eq, PartialEq)]
pub enum LossKind {
    /// `MAE`
    L1,
    /// `MSE`
    L2,
    /// `1 - MSSIM`
    Ssim,
    /// `lambda * MSE + (1 - lambda) * (1 - MSSIM)`
    Fusion1,
    /// `lambda * MAE + (1 - lambda) * (1 - MSSIM)`
    Fusion2,
}

#[derive(Clone, Debug)]
pub struct Loss<B: Backend> {
    pub kind: LossKind,
    pub lambda: f64,
    pub metric_mae: MeanAbsoluteError,
    pub metric_mssim: MeanStructuralSimilarity<B, 3>,
    pub metric_mse: MeanSquareError,
}

impl<B: Backend> Loss<B> {
    pub fn init(
        kind: LossKind,
        lambda: f64,
        device: &B::Device,
    ) -> Self {
        Self {
            kind,
            lambda,
            metric_mae: MeanAbsoluteError::init(),
            metric_mssim: MeanStructuralSimilarity::init(device),
            metric_mse: MeanSquareError::init(),
        }
    }
}

impl<AB: AutodiffBackend> Loss<AB> {
    /// ## Arguments
    ///
    /// * `value` - The rendered images with shape `[N?, 3, I_y, I_x]`.
    /// * `target` - The target images with shape `[N?, 3, I_y, I_x]`.
    ///   It never receives gradients.
    ///
    /// ## Returns
    ///
    /// The loss with shape `[1]`.
    pub fn evaluate<const D: usize>(
        &self,
        value: Tensor<AB, D>,
        target: Tensor<AB, D>,
    ) -> Tensor<AB, 1> {
        let target = target.detach();
        let lambda = self.lambda;

        match self.kind {
            LossKind::L1 => self.metric_mae.evaluate(value, target),
            LossKind::L2 => self.metric_mse.evaluate(value, target),
            LossKind::Ssim => self.get_dissimilarity(value, target),
            LossKind::Fusion1 => self
                .metric_mse
                .evaluate(value.to_owned(), target.to_owned())
                .mul_scalar(lambda)
                .add(self.get_dissimilarity(value, target).mul_scalar(1.0 - lambda)),
            LossKind::Fusion2 => self
                .metric_mae
                .evaluate(value.to_owned(), target.to_owned())
                .mul_scalar(lambda)
                .add(self.get_dissimilarity(value, target).mul_scalar(1.0 - lambda)),
        }
    }

    /// `1 - MSSIM`, ranging from `0.0` to `2.0`
    #[inline]
    fn get_dissimilarity<const D: usize>(
        &self,
        value: Tensor<AB, D>,
        target: Tensor<AB, D>,
    ) -> Tensor<AB, 1> {
        self.metric_mssim.evaluate(value, target).neg().add_scalar(1.0)
    }
}

impl Default for LossKind {
    #[inline]
    fn default() -> Self {
        Self::L2
    }
}
