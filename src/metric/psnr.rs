pub use super::*;

use std::f64::consts::LN_10;

/// Peak signal-to-noise ratio with a peak of `1.0`:
///
/// `10 * log10(1 / MSE) = -10 / ln(10) * ln(MSE)`
#[derive(Clone, Copy, Debug, Default)]
pub struct Psnr {
    pub mse: MeanSquareError,
}

impl Psnr {
    /// `-10 / ln(10)`
    pub const COEFFICIENT: f64 = -10.0 / LN_10;

    #[inline]
    pub fn init() -> Self {
        Self {
            mse: MeanSquareError::init(),
        }
    }
}

impl<B: Backend> Metric<B> for Psnr {
    /// It is infinite if the inputs are identical.
    #[inline]
    fn evaluate<const D: usize>(
        &self,
        value: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        self.mse
            .evaluate(value, target)
            .log()
            .mul_scalar(Self::COEFFICIENT)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn evaluate() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let metric = Psnr::init();

        let value = Tensor::<NdArray<f32>, 3>::ones([3, 16, 16], &device);
        let target = Tensor::<NdArray<f32>, 3>::ones([3, 16, 16], &device);
        let score = metric.evaluate(value, target).into_scalar();
        assert_eq!(score, f32::INFINITY);

        let value = Tensor::<NdArray<f32>, 3>::zeros([3, 16, 16], &device);
        let target = Tensor::<NdArray<f32>, 3>::ones([3, 16, 16], &device);
        let score = metric.evaluate(value, target).into_scalar();
        assert!(score.abs() < 1e-6, "score: {score}");

        // MSE = 0.01
        let value = Tensor::<NdArray<f32>, 4>::full([2, 3, 8, 8], 0.4, &device);
        let target = Tensor::<NdArray<f32>, 4>::full([2, 3, 8, 8], 0.5, &device);
        let score = metric.evaluate(value, target).into_scalar();
        assert!((score - 20.0).abs() < 1e-3, "score: {score}");

        // MSE = 0.25
        let value = Tensor::<NdArray<f32>, 2>::from_floats(
            [[0.0, 0.1, 0.2], [0.5, 0.4, 0.3]],
            &device,
        );
        let target = Tensor::<NdArray<f32>, 2>::from_floats(
            [[0.5, 0.6, 0.7], [0.0, 0.9, 0.8]],
            &device,
        );
        let score = metric.evaluate(value, target).into_scalar();
        assert!((score - 6.0206).abs() < 1e-3, "score: {score}");
    }
}
