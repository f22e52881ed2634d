//! Training the 2D Gaussian basis in two phases.
//!
//! 1. [`OptimizationPhase::Features`]: fitting the basis components with
//!    [`Gaussian2dBasisTrainer::train_iter`].
//! 2. [`OptimizationPhase::Colors`]: fitting the final colors with
//!    [`Gaussian2dBasisTrainer::optimize_iter`].
//!
//! The positions and the Cholesky factors are trained in both phases.

pub mod config;
pub mod loss;
pub mod optimize;

pub use crate::{
    metric::{
        MeanAbsoluteError, MeanSquareError, MeanStructuralSimilarity, Metric, Psnr,
    },
    optimize::*,
    range::RangeOptions,
    scene::gaussian_2d::*,
};
pub use config::*;
pub use loss::*;

use burn::tensor::ElementConversion;
use std::fmt;

/// The parameter group being optimized.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptimizationPhase {
    /// The features are trainable and the colors are frozen.
    Features,
    /// The colors are trainable and the features are frozen.
    Colors,
}

#[derive(Clone)]
pub struct Gaussian2dBasisTrainer<AB: AutodiffBackend> {
    pub config: Gaussian2dBasisTrainerConfig,
    pub iteration: u64,
    pub learning_rate: LearningRate,
    pub loss: Loss<AB>,
    pub metric_psnr: Psnr,
    pub optimizer_cholesky: ParamOptimizer<AB, 2>,
    pub optimizer_colors: ParamOptimizer<AB, 2>,
    pub optimizer_features: ParamOptimizer<AB, 3>,
    pub optimizer_positions: ParamOptimizer<AB, 2>,
    pub options_renderer: RenderOptions,
    pub phase: OptimizationPhase,
    pub scene: Gaussian2dBasis<AB>,
}

impl<AB: AutodiffBackend> Gaussian2dBasisTrainer<AB> {
    /// Entering the phase with fresh optimizers and a fresh learning rate.
    ///
    /// The previous optimizer states are discarded.
    pub fn init_phase(
        &mut self,
        phase: OptimizationPhase,
    ) -> &mut Self {
        let is_colors_trainable = phase == OptimizationPhase::Colors;

        self.scene
            .set_require_grad_colors(is_colors_trainable)
            .set_require_grad_features(!is_colors_trainable)
            .set_require_grad_shapes(true);

        self.learning_rate = self.config.learning_rate.init();
        self.optimizer_cholesky = self.config.optimizer.init();
        self.optimizer_colors = self.config.optimizer.init();
        self.optimizer_features = self.config.optimizer.init();
        self.optimizer_positions = self.config.optimizer.init();
        self.phase = phase;

        log::info!(
            target: "gausplat::basis::train",
            "init_phase > {phase:?} (iteration {}, optimizer {:?}, learning_rate {})",
            self.iteration,
            self.config.optimizer.kind,
            *self.learning_rate,
        );

        self
    }

    /// Fitting the basis components for an iteration.
    ///
    /// ## Arguments
    ///
    /// * `target` - The target components with shape `[K, 3, I_y, I_x]`.
    ///
    /// ## Returns
    ///
    /// The loss and the PSNR.
    pub fn train_iter(
        &mut self,
        target: Tensor<AB, 4>,
    ) -> Result<(f64, f64), Error> {
        self.check_phase(OptimizationPhase::Features)?;

        let options = &self.options_renderer;
        Self::check_shape(
            &target.dims(),
            &[
                self.scene.component_count(),
                3,
                options.image_height as usize,
                options.image_width as usize,
            ],
        )?;

        // [K, 3, I_y, I_x]
        let value = self.scene.render_features(options)?;

        self.step(value, target)
    }

    /// Fitting the final colors for an iteration.
    ///
    /// The image mean is added to every channel of the rendered colors.
    ///
    /// ## Arguments
    ///
    /// * `target` - The target image with shape `[3, I_y, I_x]`.
    ///
    /// ## Returns
    ///
    /// The loss and the PSNR.
    pub fn optimize_iter(
        &mut self,
        target: Tensor<AB, 3>,
    ) -> Result<(f64, f64), Error> {
        self.check_phase(OptimizationPhase::Colors)?;

        let options = &self.options_renderer;
        let image_height = options.image_height as usize;
        let image_width = options.image_width as usize;
        let pixel_count = options.pixel_count();
        Self::check_shape(&target.dims(), &[3, image_height, image_width])?;

        // [3, I_y * I_x] <- [3, I_y * I_x] + [1, I_y * I_x]
        let value = self
            .scene
            .render_colors(options)?
            .reshape([3, pixel_count])
            .add(
                self.scene
                    .image_mean
                    .to_owned()
                    .reshape([1, pixel_count])
                    .expand([3, pixel_count]),
            )
            .reshape([3, image_height, image_width]);

        self.step(value, target)
    }

    fn step<const D: usize>(
        &mut self,
        value: Tensor<AB, D>,
        target: Tensor<AB, D>,
    ) -> Result<(f64, f64), Error> {
        let loss = self.loss.evaluate(value.to_owned(), target.to_owned());
        let psnr = self.metric_psnr.evaluate(value.inner(), target.inner());

        let grads = loss.backward();
        self.optimize(grads);
        self.learning_rate.update();

        let loss = loss.into_scalar().elem::<f64>();
        let psnr = psnr.into_scalar().elem::<f64>();

        #[cfg(all(debug_assertions, not(test)))]
        {
            if self.config.range_metric_logging.has(self.iteration) {
                log::debug!(
                    target: "gausplat::basis::train",
                    "{:?} > iteration ({}) > loss ({loss}) > psnr ({psnr})",
                    self.phase,
                    self.iteration,
                );
            }
        }

        self.iteration += 1;

        Ok((loss, psnr))
    }

    fn check_phase(
        &self,
        phase: OptimizationPhase,
    ) -> Result<(), Error> {
        if self.phase != phase {
            return Err(Error::MismatchedOptimizationPhase(self.phase, phase));
        }
        Ok(())
    }

    fn check_shape(
        shape: &[usize],
        shape_expected: &[usize],
    ) -> Result<(), Error> {
        if shape != shape_expected {
            return Err(Error::MismatchedTensorShape(
                shape.to_vec(),
                shape_expected.to_vec(),
            ));
        }
        Ok(())
    }
}

impl<AB: AutodiffBackend> fmt::Debug for Gaussian2dBasisTrainer<AB> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct(&format!("Gaussian2dBasisTrainer<{}>", AB::name()))
            .field("config", &self.config)
            .field("iteration", &self.iteration)
            .field("learning_rate", &self.learning_rate)
            .field("options_renderer", &self.options_renderer)
            .field("phase", &self.phase)
            .field("scene", &self.scene)
            .finish()
    }
}
