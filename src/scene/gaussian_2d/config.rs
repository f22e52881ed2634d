pub use super::*;
pub use burn::config::Config;

use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};

/// The bound added to the raw Cholesky factors, `(l_1, l_2, l_3)`.
pub const CHOLESKY_BOUND: [f32; 3] = [0.5, 0.0, 0.5];

#[derive(Config, Debug, PartialEq)]
pub struct Gaussian2dBasisConfig {
    /// `P`
    pub point_count: usize,

    /// `K`
    pub component_count: usize,

    /// `I_y`
    pub image_height: u32,

    /// `I_x`
    pub image_width: u32,

    #[config(default = "0x2D65")]
    pub seed: u64,
}

impl Gaussian2dBasisConfig {
    /// Initializing the Gaussians randomly.
    ///
    /// ## Details
    ///
    /// * `positions <- atanh(2 * (u - 0.5))`, so the activated positions are uniform
    /// * `cholesky <- u`
    /// * `features <- u`
    /// * `colors <- 0`
    /// * `opacities <- 1`
    ///
    /// where `u ~ U[0, 1)` is sampled by a generator seeded with [`Self::seed`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Gaussian2dBasis<B> {
        // The activated positions should never reach the infinities
        const POSITION_BOUND: f32 = 1.0 - 1e-6;

        let point_count = self.point_count;
        let component_count = self.component_count;
        let pixel_count = self.image_height as usize * self.image_width as usize;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let distribution = Uniform::new(0.0_f32, 1.0);
        let mut sample = |count: usize| -> Vec<f32> {
            (0..count).map(|_| rng.sample(&distribution)).collect()
        };

        // [P, 2]
        let positions = sample(point_count * 2)
            .into_iter()
            .map(|u| (2.0 * (u - 0.5)).clamp(-POSITION_BOUND, POSITION_BOUND).atanh())
            .collect();
        let positions = get_tensor_from_vec::<B, 2>(positions, [point_count, 2], device);

        // [P, 3]
        let cholesky =
            get_tensor_from_vec::<B, 2>(sample(point_count * 3), [point_count, 3], device);

        // [K, P, 3]
        let features = get_tensor_from_vec::<B, 3>(
            sample(component_count * point_count * 3),
            [component_count, point_count, 3],
            device,
        );

        // [P, 3]
        let colors = Tensor::zeros([point_count, 3], device);

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::basis::scene",
            "Gaussian2dBasisConfig::init > point_count ({point_count}) > component_count ({component_count})",
        );

        Gaussian2dBasis {
            background: Tensor::ones([3], device),
            cholesky: Param::initialized(ParamId::new(), cholesky.set_require_grad(true)),
            cholesky_bound: Tensor::from_floats([CHOLESKY_BOUND], device),
            colors: Param::initialized(ParamId::new(), colors.set_require_grad(false)),
            features: Param::initialized(ParamId::new(), features.set_require_grad(true)),
            image_mean: Tensor::zeros([pixel_count], device),
            opacities: Tensor::ones([point_count, 1], device),
            positions: Param::initialized(ParamId::new(), positions.set_require_grad(true)),
            scale_factor: Tensor::ones([1], device),
            shift_factor: Tensor::zeros([1], device),
        }
    }
}

fn get_tensor_from_vec<B: Backend, const D: usize>(
    values: Vec<f32>,
    shape: [usize; D],
    device: &B::Device,
) -> Tensor<B, D> {
    Tensor::from_data(TensorData::new(values, shape).convert::<B::FloatElem>(), device)
}
