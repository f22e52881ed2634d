pub use super::*;

#[derive(Config, Debug)]
pub struct Gaussian2dBasisTrainerConfig {
    pub scene: Gaussian2dBasisConfig,

    #[config(default = "1e-3.into()")]
    pub learning_rate: LearningRateConfig,

    #[config(default = "LossKind::L2")]
    pub loss: LossKind,

    /// The weight of the pixel-wise term in the fusion losses.
    #[config(default = "0.7")]
    pub loss_lambda: f64,

    #[config(default = "Default::default()")]
    pub optimizer: OptimizerConfig,

    /// The iterations to log the loss and PSNR at.
    #[config(default = "RangeOptions::every(100)")]
    pub range_metric_logging: RangeOptions,

    #[config(default = "16")]
    pub tile_height: u32,

    #[config(default = "16")]
    pub tile_width: u32,
}

impl Gaussian2dBasisTrainerConfig {
    /// Initializing the trainer with a random scene in the feature phase.
    pub fn init<AB: AutodiffBackend>(
        &self,
        device: &AB::Device,
    ) -> Gaussian2dBasisTrainer<AB> {
        self.init_with_scene(self.scene.init(device))
    }

    /// Initializing the trainer with a given scene in the feature phase,
    /// for example one loaded from a checkpoint.
    pub fn init_from_scene<AB: AutodiffBackend>(
        &self,
        scene: Gaussian2dBasis<AB>,
    ) -> Result<Gaussian2dBasisTrainer<AB>, Error> {
        let component_count = self.scene.component_count;
        let point_count = self.scene.point_count;
        let pixel_count = self.scene.image_height as usize * self.scene.image_width as usize;

        let shape = vec![component_count, point_count, pixel_count];
        let shape_scene = vec![
            scene.component_count(),
            scene.point_count(),
            scene.image_mean.dims()[0],
        ];
        if shape_scene != shape {
            return Err(Error::MismatchedTensorShape(shape_scene, shape));
        }

        Ok(self.init_with_scene(scene))
    }

    fn init_with_scene<AB: AutodiffBackend>(
        &self,
        scene: Gaussian2dBasis<AB>,
    ) -> Gaussian2dBasisTrainer<AB> {
        let device = scene.device();
        let options_renderer =
            RenderOptions::new(self.scene.image_height, self.scene.image_width)
                .with_tile_height(self.tile_height)
                .with_tile_width(self.tile_width);

        let mut trainer = Gaussian2dBasisTrainer {
            config: self.to_owned(),
            iteration: 0,
            learning_rate: self.learning_rate.init(),
            loss: Loss::init(self.loss, self.loss_lambda, &device),
            metric_psnr: Psnr::init(),
            optimizer_cholesky: self.optimizer.init(),
            optimizer_colors: self.optimizer.init(),
            optimizer_features: self.optimizer.init(),
            optimizer_positions: self.optimizer.init(),
            options_renderer,
            phase: OptimizationPhase::Features,
            scene,
        };
        trainer.init_phase(OptimizationPhase::Features);

        trainer
    }
}

impl From<Gaussian2dBasisConfig> for Gaussian2dBasisTrainerConfig {
    #[inline]
    fn from(scene: Gaussian2dBasisConfig) -> Self {
        Self::new(scene)
    }
}
