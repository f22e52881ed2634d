//! Mean of structural similarity index (MSSIM) metric.

pub use super::*;

use burn::tensor::{
    module::conv2d,
    ops::ConvOptions,
    Int,
};

/// Computing the mean of structural similarity index (MSSIM) between the inputs
/// using the approaches described in the paper:
///
/// *Wang, J., Bovik, A. C., Sheikh, H. R., & Simoncelli, E. P. (2004). Image quality assessment: from error visibility to structural similarity. IEEE Transactions on Image Processing, 13(4), 600–612.*
/// https://www.cns.nyu.edu/pub/lcv/wang03-preprint.pdf
///
/// ## Details
///
/// - `self.filter`: `[C, 1, 11, 11]`
///   - A normalized gaussian filter applied to each channel
///   - It is a constant, so no gradient flows into it
/// - The filter is only applied where it fits in the image ("valid"),
///   so the borders are not biased by zero padding.
///   A side shorter than the filter is padded instead.
#[derive(Clone, Debug)]
pub struct MeanStructuralSimilarity<B: Backend, const C: usize> {
    pub filter: Tensor<B, 4>,
}

impl<B: Backend, const C: usize> MeanStructuralSimilarity<B, C> {
    pub const FILTER_SIZE: usize = 11;
    pub const FILTER_STD: f64 = 1.5;

    pub fn init(device: &B::Device) -> Self {
        let size_half = (Self::FILTER_SIZE >> 1) as i64;
        // 2s^2
        let std2_2 = 2.0 * Self::FILTER_STD * Self::FILTER_STD;

        // x = [-5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5]
        let x = Tensor::<B, 1, Int>::arange(-size_half..size_half + 1, device);
        // -x^2[1, 11]
        let x2_n = x.to_owned().mul(x).neg().float().unsqueeze::<2>();
        // -y^2[11, 1]
        let y2_n = x2_n.to_owned().transpose();
        // -(x^2 + y^2)[11, 11] = -x^2[1, 11] + -y^2[11, 1]
        let x2_y2_n = x2_n.expand([Self::FILTER_SIZE; 2])
            + y2_n.expand([Self::FILTER_SIZE; 2]);
        // w[11, 11] = exp(-(x^2 + y^2) / 2s^2)[11, 11]
        let w = x2_y2_n.div_scalar(std2_2).exp();
        // w'[11, 11] = w[11, 11] / sum(w)[1, 1]
        let w_normalized = w
            .to_owned()
            .div(w.sum().reshape([1, 1]).expand([Self::FILTER_SIZE; 2]));

        // w'[C, 1, 11, 11]
        let filter = Tensor::cat(
            vec![w_normalized.reshape([1, 1, Self::FILTER_SIZE, Self::FILTER_SIZE]); C],
            0,
        );

        Self { filter }
    }

    /// `F(x) = sum(w' * x)`
    fn filter(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [_, _, height, width] = input.dims();
        let padding = [height, width].map(|size| {
            if size < Self::FILTER_SIZE {
                Self::FILTER_SIZE >> 1
            } else {
                0
            }
        });
        let filter = self.filter.to_owned().to_device(&input.device());

        conv2d(input, filter, None, ConvOptions::new([1, 1], padding, [1, 1], C))
    }
}

impl<B: Backend, const C: usize> Metric<B> for MeanStructuralSimilarity<B, C> {
    /// Computing the mean of structural similarity index (MSSIM) between the inputs
    /// using the equations 13-16 and settings in the paper.
    ///
    /// ## Arguments
    ///
    /// * `value` - The input tensor with shape `[N?, C, H, W]`.
    /// * `target` - The target tensor with shape `[N?, C, H, W]`.
    ///
    /// ## Returns
    ///
    /// The mean of structural similarity index (MSSIM) with shape `[1]`.
    ///
    /// ## Details
    ///
    /// * The argument value should range from `0.0` to `1.0`
    /// * The result value ranges from `-1.0` to `1.0`
    fn evaluate<const D: usize>(
        &self,
        value: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        const K1: f64 = 0.01;
        const K2: f64 = 0.03;
        const L: f64 = 1.0;
        const C1: f64 = (K1 * L) * (K1 * L);
        const C2: f64 = (K2 * L) * (K2 * L);

        debug_assert_eq!(value.dims(), target.dims());
        debug_assert!(D >= 3, "The inputs should have the shape [N?, C, H, W]");

        let dims = value.dims();
        let [channel_count, height, width] = [dims[D - 3], dims[D - 2], dims[D - 1]];
        let batch_count = dims[..D - 3].iter().product::<usize>();
        debug_assert_eq!(channel_count, C);

        let shape = [batch_count, channel_count, height, width];
        let input = (value.reshape(shape), target.reshape(shape));

        // m0 = F(x0)
        // m1 = F(x1)
        let mean = (
            self.filter(input.0.to_owned()),
            self.filter(input.1.to_owned()),
        );
        // m0^2 = m0 * m0
        // m1^2 = m1 * m1
        let mean2 = (
            mean.0.to_owned() * mean.0.to_owned(),
            mean.1.to_owned() * mean.1.to_owned(),
        );
        // s0^2 = F(x0^2) - m0^2
        // s1^2 = F(x1^2) - m1^2
        let std2 = (
            self.filter(input.0.to_owned() * input.0.to_owned())
                .sub(mean2.0.to_owned()),
            self.filter(input.1.to_owned() * input.1.to_owned())
                .sub(mean2.1.to_owned()),
        );
        // m_01 = m0 * m1
        let mean_01 = mean.0 * mean.1;
        // s_01 = F(x0 * x1) - m_01
        let std_01 = self.filter(input.0 * input.1) - mean_01.to_owned();
        // I(x0, x1) =
        // (2 * m_01 + C1) * (2 * s_01 + C2) /
        // ((m0^2 + m1^2 + C1) * (s0^2 + s1^2 + C2))
        let indexes = (mean_01.mul_scalar(2.0).add_scalar(C1))
            * (std_01.mul_scalar(2.0).add_scalar(C2))
            / ((mean2.0 + mean2.1).add_scalar(C1) * (std2.0 + std2.1).add_scalar(C2));

        // MI(x0, x1) = mean(I(x0, x1))
        indexes.mean()
    }
}

impl<B: Backend, const C: usize> Default for MeanStructuralSimilarity<B, C> {
    #[inline]
    fn default() -> Self {
        Self::init(&Default::default())
    }
}
