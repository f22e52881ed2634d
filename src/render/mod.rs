//! Differentiable rendering of 2D Gaussians.
//!
//! The rendering is split into two stages:
//!
//! 1. [`project`]: Mapping the Gaussians to the pixel space, computing
//!    the conics and binning the Gaussians into the tiles they touch.
//! 2. [`rasterize_sum`]: Accumulating the weighted colors of the binned
//!    Gaussians for each pixel of each tile.
//!
//! Both stages are tensor programs, so the gradients come from the backend.

pub mod project;
pub mod rasterize;

pub use crate::error::Error;
pub use burn::{
    config::Config,
    tensor::{backend::Backend, Int, Tensor, TensorData},
};
pub use project::*;
pub use rasterize::*;

#[derive(Config, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// `I_y`
    pub image_height: u32,

    /// `I_x`
    pub image_width: u32,

    /// `T_y`
    #[config(default = "16")]
    pub tile_height: u32,

    /// `T_x`
    #[config(default = "16")]
    pub tile_width: u32,
}

/// The tile counts covering the image.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TileBounds {
    /// `(I_x + T_x - 1) / T_x`
    pub count_x: u32,
    /// `(I_y + T_y - 1) / T_y`
    pub count_y: u32,
}

impl RenderOptions {
    #[inline]
    pub fn tile_bounds(&self) -> TileBounds {
        TileBounds {
            count_x: self.image_width.div_ceil(self.tile_width.max(1)),
            count_y: self.image_height.div_ceil(self.tile_height.max(1)),
        }
    }

    /// `I_y * I_x`
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.image_height as usize * self.image_width as usize
    }
}

impl TileBounds {
    /// `T_count`
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.count_x as usize * self.count_y as usize
    }
}
