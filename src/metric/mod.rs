//! Image metrics used as losses and for reporting.
//!
//! The inputs of every metric share the same shape, and the colors range
//! from `0.0` to `1.0`.

pub mod mssim;
pub mod pixel;
pub mod psnr;

pub use burn::tensor::{backend::Backend, Tensor};
pub use mssim::*;
pub use pixel::*;
pub use psnr::*;

pub trait Metric<B: Backend> {
    /// ## Returns
    ///
    /// The score of `value` against `target` with shape `[1]`.
    fn evaluate<const D: usize>(
        &self,
        value: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1>;
}
