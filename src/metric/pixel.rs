//! Per-pixel error metrics.

pub use super::*;

/// The mean of absolute errors, `mean(|value - target|)`.
pub type MeanAbsoluteError = MeanPixelError<1>;

/// The mean of squared errors, `mean((value - target) ^ 2)`.
pub type MeanSquareError = MeanPixelError<2>;

/// The mean of the `P`-th power of the absolute differences between pixels.
///
/// Only `P = 1` and `P = 2` are provided as aliases. Other orders use
/// [`Tensor::powi_scalar`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeanPixelError<const P: u8>;

impl<const P: u8> MeanPixelError<P> {
    pub const ORDER: u8 = P;

    #[inline]
    pub fn init() -> Self {
        Self
    }
}

impl<B: Backend, const P: u8> Metric<B> for MeanPixelError<P> {
    fn evaluate<const D: usize>(
        &self,
        value: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        debug_assert_eq!(value.dims(), target.dims());

        let difference = value - target;
        match P {
            1 => difference.abs().mean(),
            2 => difference.to_owned().mul(difference).mean(),
            _ => difference.abs().powi_scalar(P as i32).mean(),
        }
    }
}
