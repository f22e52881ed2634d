pub mod config;
pub mod record;

pub use crate::{error::Error, render::*};
pub use burn::{
    module::{Param, ParamId},
    tensor::{backend::Backend, Tensor, TensorData},
};
pub use config::*;
pub use record::*;

use std::fmt;

/// A set of 2D Gaussians fitting an image with `K` basis components.
///
/// ## Details
///
/// The parameters are stored before activation:
///
/// * `positions` - `tanh` maps them into the normalized image space `[-1, 1]`.
/// * `cholesky` - Adding [`Self::cholesky_bound`] bounds the diagonal of the factor.
/// * `features` - The per-component colors, rendered in the feature phase.
/// * `colors` - The final colors, rendered in the color phase.
///
/// The other tensors are buffers and never optimized.
#[derive(Clone)]
pub struct Gaussian2dBasis<B: Backend> {
    /// The shape is `[3]`
    pub background: Tensor<B, 1>,
    /// The shape is `[P, 3]`
    pub cholesky: Param<Tensor<B, 2>>,
    /// The shape is `[1, 3]`
    pub cholesky_bound: Tensor<B, 2>,
    /// The shape is `[P, 3]`
    pub colors: Param<Tensor<B, 2>>,
    /// The shape is `[K, P, 3]`
    pub features: Param<Tensor<B, 3>>,
    /// The shape is `[I_y * I_x]`
    pub image_mean: Tensor<B, 1>,
    /// The shape is `[P, 1]`
    pub opacities: Tensor<B, 2>,
    /// The shape is `[P, 2]`
    pub positions: Param<Tensor<B, 2>>,
    /// The shape is `[1]`
    pub scale_factor: Tensor<B, 1>,
    /// The shape is `[1]`
    pub shift_factor: Tensor<B, 1>,
}

/// Activations
impl<B: Backend> Gaussian2dBasis<B> {
    /// The shape is `[P, 3]`
    #[inline]
    pub fn get_cholesky(&self) -> Tensor<B, 2> {
        let [point_count, _] = self.cholesky.dims();
        if point_count == 0 {
            return self.cholesky.val();
        }
        self.cholesky.val() + self.cholesky_bound.to_owned().expand([point_count, 3])
    }

    /// The shape is `[P, 3]`
    #[inline]
    pub fn get_colors(&self) -> Tensor<B, 2> {
        self.colors.val()
    }

    /// The shape is `[K, P, 3]`
    #[inline]
    pub fn get_features(&self) -> Tensor<B, 3> {
        self.features.val()
    }

    /// The shape is `[P, 1]`
    #[inline]
    pub fn get_opacities(&self) -> Tensor<B, 2> {
        self.opacities.to_owned()
    }

    /// The shape is `[P, 2]`
    #[inline]
    pub fn get_positions(&self) -> Tensor<B, 2> {
        self.positions.val().tanh()
    }
}

/// Rendering
impl<B: Backend> Gaussian2dBasis<B> {
    /// Rendering every basis component with the shared projection.
    ///
    /// ## Returns
    ///
    /// The components with shape `[K, 3, I_y, I_x]`, not clamped.
    pub fn render_features(
        &self,
        options: &RenderOptions,
    ) -> Result<Tensor<B, 4>, Error> {
        let [component_count, point_count, _] = self.features.dims();
        let image_height = options.image_height as usize;
        let image_width = options.image_width as usize;

        let projection = project(self.get_positions(), self.get_cholesky(), options)?;

        // [P, K * 3] <- [P, K, 3] <- [K, P, 3]
        let features = self
            .get_features()
            .swap_dims(0, 1)
            .reshape([point_count, component_count * 3]);

        // The rasterization is linear in the colors, so the components
        // are rasterized at once as channels.
        let image = rasterize_sum(&projection, features, self.get_opacities(), options);

        // [K, 3, I_y, I_x] <- [I_y, I_x, K, 3]
        Ok(image
            .reshape([image_height, image_width, component_count, 3])
            .swap_dims(0, 2)
            .swap_dims(1, 3))
    }

    /// Rendering the final colors, scaled by [`Self::scale_factor`] and shifted by
    /// [`Self::shift_factor`].
    ///
    /// ## Returns
    ///
    /// The image with shape `[3, I_y, I_x]`.
    pub fn render_colors(
        &self,
        options: &RenderOptions,
    ) -> Result<Tensor<B, 3>, Error> {
        let image_height = options.image_height as usize;
        let image_width = options.image_width as usize;
        let image_shape = [image_height, image_width, 3];

        let projection = project(self.get_positions(), self.get_cholesky(), options)?;

        // [I_y, I_x, 3]
        let image = rasterize_sum(&projection, self.get_colors(), self.get_opacities(), options)
            .mul(self.scale_factor.to_owned().reshape([1, 1, 1]).expand(image_shape))
            .add(self.shift_factor.to_owned().reshape([1, 1, 1]).expand(image_shape));

        // [3, I_y, I_x] <- [I_y, I_x, 3]
        Ok(image.swap_dims(0, 2).swap_dims(1, 2))
    }
}

/// Buffers
impl<B: Backend> Gaussian2dBasis<B> {
    /// ## Arguments
    ///
    /// * `image_mean` - The mean added to every channel in the color phase,
    ///   with shape `[I_y * I_x]`.
    pub fn set_image_mean(
        &mut self,
        image_mean: Tensor<B, 1>,
    ) -> Result<&mut Self, Error> {
        if image_mean.dims() != self.image_mean.dims() {
            return Err(Error::MismatchedTensorShape(
                image_mean.dims().into(),
                self.image_mean.dims().into(),
            ));
        }

        self.image_mean = image_mean.set_require_grad(false);
        Ok(self)
    }

    #[inline]
    pub fn set_scale_factor(
        &mut self,
        scale_factor: f64,
    ) -> &mut Self {
        self.scale_factor = Tensor::full([1], scale_factor, &self.scale_factor.device());
        self
    }

    #[inline]
    pub fn set_shift_factor(
        &mut self,
        shift_factor: f64,
    ) -> &mut Self {
        self.shift_factor = Tensor::full([1], shift_factor, &self.shift_factor.device());
        self
    }
}

/// Parameters
impl<B: Backend> Gaussian2dBasis<B> {
    #[inline]
    pub fn set_inner_cholesky(
        &mut self,
        cholesky: Tensor<B, 2>,
    ) -> &mut Self {
        self.cholesky = Param::initialized(self.cholesky.id.to_owned(), cholesky);
        self
    }

    #[inline]
    pub fn set_inner_colors(
        &mut self,
        colors: Tensor<B, 2>,
    ) -> &mut Self {
        self.colors = Param::initialized(self.colors.id.to_owned(), colors);
        self
    }

    #[inline]
    pub fn set_inner_features(
        &mut self,
        features: Tensor<B, 3>,
    ) -> &mut Self {
        self.features = Param::initialized(self.features.id.to_owned(), features);
        self
    }

    #[inline]
    pub fn set_inner_positions(
        &mut self,
        positions: Tensor<B, 2>,
    ) -> &mut Self {
        self.positions = Param::initialized(self.positions.id.to_owned(), positions);
        self
    }

    /// Freezing or unfreezing the colors.
    pub fn set_require_grad_colors(
        &mut self,
        is_require_grad: bool,
    ) -> &mut Self {
        let colors = self.colors.val().set_require_grad(is_require_grad);
        self.set_inner_colors(colors)
    }

    /// Freezing or unfreezing the features.
    pub fn set_require_grad_features(
        &mut self,
        is_require_grad: bool,
    ) -> &mut Self {
        let features = self.features.val().set_require_grad(is_require_grad);
        self.set_inner_features(features)
    }

    /// Freezing or unfreezing the positions and the Cholesky factors.
    pub fn set_require_grad_shapes(
        &mut self,
        is_require_grad: bool,
    ) -> &mut Self {
        let cholesky = self.cholesky.val().set_require_grad(is_require_grad);
        let positions = self.positions.val().set_require_grad(is_require_grad);
        self.set_inner_cholesky(cholesky)
            .set_inner_positions(positions)
    }

    /// `K`
    #[inline]
    pub fn component_count(&self) -> usize {
        self.features.dims()[0]
    }

    /// `P`
    #[inline]
    pub fn point_count(&self) -> usize {
        self.positions.dims()[0]
    }

    #[inline]
    pub fn device(&self) -> B::Device {
        self.positions.device()
    }
}

impl<B: Backend> fmt::Debug for Gaussian2dBasis<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct(&format!("Gaussian2dBasis<{}>", B::name()))
            .field("device", &self.device())
            .field("cholesky.dims()", &self.cholesky.dims())
            .field("colors.dims()", &self.colors.dims())
            .field("features.dims()", &self.features.dims())
            .field("image_mean.dims()", &self.image_mean.dims())
            .field("opacities.dims()", &self.opacities.dims())
            .field("positions.dims()", &self.positions.dims())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn activations() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let scene = Gaussian2dBasisConfig::new(4, 2, 8, 8).init::<NdArray<f32>>(&device);

        let positions = scene.get_positions().into_data().to_vec::<f32>().unwrap();
        assert!(positions.iter().all(|p| (-1.0..=1.0).contains(p)), "{positions:?}");

        let cholesky = scene.get_cholesky();
        let bound = cholesky.to_owned() - scene.cholesky.val();
        let target = TensorData::from([[0.5, 0.0, 0.5]; 4]);
        bound.into_data().assert_approx_eq(&target, 6);

        let opacities = scene.get_opacities().into_data().to_vec::<f32>().unwrap();
        assert_eq!(opacities, vec![1.0; 4]);
    }

    #[test]
    fn render_shapes() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(12, 20).with_tile_height(8).with_tile_width(8);
        let scene = Gaussian2dBasisConfig::new(16, 3, 12, 20).init::<NdArray<f32>>(&device);

        let features = scene.render_features(&options).unwrap();
        assert_eq!(features.dims(), [3, 3, 12, 20]);

        let colors = scene.render_colors(&options).unwrap();
        assert_eq!(colors.dims(), [3, 12, 20]);
    }

    #[test]
    fn render_empty() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(8, 8).with_tile_height(4).with_tile_width(4);
        let scene = Gaussian2dBasisConfig::new(0, 2, 8, 8).init::<NdArray<f32>>(&device);
        assert_eq!(scene.point_count(), 0);

        let features = scene.render_features(&options).unwrap();
        assert_eq!(features.dims(), [2, 3, 8, 8]);
        assert_eq!(features.abs().sum().into_scalar(), 0.0);

        let colors = scene.render_colors(&options).unwrap();
        assert_eq!(colors.dims(), [3, 8, 8]);
        assert_eq!(colors.abs().sum().into_scalar(), 0.0);
    }

    #[test]
    fn render_features_per_component() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(10, 10).with_tile_height(4).with_tile_width(4);
        let mut scene =
            Gaussian2dBasisConfig::new(8, 2, 10, 10).init::<NdArray<f32>>(&device);

        let features = scene.render_features(&options).unwrap();

        // Rendering the second component as the colors
        let colors = scene.get_features().slice([1..2, 0..8, 0..3]).squeeze::<2>(0);
        scene.set_inner_colors(colors);
        let target = scene.render_colors(&options).unwrap();

        let output = features.slice([1..2, 0..3, 0..10, 0..10]).squeeze::<3>(0);
        output.into_data().assert_approx_eq(&target.into_data(), 5);
    }

    #[test]
    fn render_colors_scaled_and_shifted() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(6, 6);
        let mut scene = Gaussian2dBasisConfig::new(5, 1, 6, 6).init::<NdArray<f32>>(&device);
        scene.set_inner_colors(Tensor::ones([5, 3], &device));

        let image = scene.render_colors(&options).unwrap();
        let target = image.mul_scalar(2.0).add_scalar(-0.25);

        scene.set_scale_factor(2.0).set_shift_factor(-0.25);
        let output = scene.render_colors(&options).unwrap();
        output.into_data().assert_approx_eq(&target.into_data(), 5);
    }

    #[test]
    fn set_image_mean() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let mut scene = Gaussian2dBasisConfig::new(5, 1, 4, 3).init::<NdArray<f32>>(&device);

        scene.set_image_mean(Tensor::ones([12], &device)).unwrap();
        assert_eq!(scene.image_mean.to_owned().sum().into_scalar(), 12.0);

        scene.set_image_mean(Tensor::ones([4, 3], &device).flatten(0, 1)).unwrap();
        scene.set_image_mean(Tensor::ones([11], &device)).unwrap_err();
    }

    #[test]
    fn set_require_grad() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        let device = Default::default();
        let mut scene = Gaussian2dBasisConfig::new(5, 2, 4, 4)
            .init::<Autodiff<NdArray<f32>>>(&device);

        assert!(scene.features.is_require_grad());
        assert!(!scene.colors.is_require_grad());

        let features_id = scene.features.id.to_owned();
        scene
            .set_require_grad_colors(true)
            .set_require_grad_features(false);

        assert!(!scene.features.is_require_grad());
        assert!(scene.colors.is_require_grad());
        assert!(scene.positions.is_require_grad());
        assert_eq!(scene.features.id, features_id);
    }
}
