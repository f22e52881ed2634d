pub use super::*;
pub use burn::record::{
    FullPrecisionSettings, NamedMpkFileRecorder, Record, Recorder,
};

use std::path::PathBuf;

/// The recorder for the file of [`Gaussian2dBasis`].
///
/// The extension `.mpk` is appended to the file path.
pub type Gaussian2dBasisRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

#[derive(Clone, Debug, Record)]
pub struct Gaussian2dBasisRecord<B: Backend> {
    pub background: Tensor<B, 1>,
    pub cholesky: Tensor<B, 2>,
    pub cholesky_bound: Tensor<B, 2>,
    pub colors: Tensor<B, 2>,
    pub features: Tensor<B, 3>,
    pub image_mean: Tensor<B, 1>,
    pub opacities: Tensor<B, 2>,
    pub positions: Tensor<B, 2>,
    pub scale_factor: Tensor<B, 1>,
    pub shift_factor: Tensor<B, 1>,
}

impl<B: Backend> Gaussian2dBasis<B> {
    /// Initializing from the record.
    ///
    /// The colors are frozen and the others parameters are trainable,
    /// as in [`Gaussian2dBasisConfig::init`].
    pub fn from_record(record: Gaussian2dBasisRecord<B>) -> Self {
        Self {
            background: record.background,
            cholesky: Param::initialized(
                ParamId::new(),
                record.cholesky.set_require_grad(true),
            ),
            cholesky_bound: record.cholesky_bound,
            colors: Param::initialized(
                ParamId::new(),
                record.colors.set_require_grad(false),
            ),
            features: Param::initialized(
                ParamId::new(),
                record.features.set_require_grad(true),
            ),
            image_mean: record.image_mean,
            opacities: record.opacities,
            positions: Param::initialized(
                ParamId::new(),
                record.positions.set_require_grad(true),
            ),
            scale_factor: record.scale_factor,
            shift_factor: record.shift_factor,
        }
    }

    /// Loading the record while keeping the parameter ids and
    /// whether the parameters require gradients.
    ///
    /// The record must have the same point count, component count
    /// and image size as the scene. Otherwise, nothing is loaded.
    pub fn load_record(
        &mut self,
        record: Gaussian2dBasisRecord<B>,
    ) -> Result<&mut Self, Error> {
        let shapes = [
            (record.cholesky.dims().to_vec(), self.cholesky.dims().to_vec()),
            (record.colors.dims().to_vec(), self.colors.dims().to_vec()),
            (record.features.dims().to_vec(), self.features.dims().to_vec()),
            (record.image_mean.dims().to_vec(), self.image_mean.dims().to_vec()),
            (record.opacities.dims().to_vec(), self.opacities.dims().to_vec()),
            (record.positions.dims().to_vec(), self.positions.dims().to_vec()),
        ];
        if let Some((shape, shape_expected)) =
            shapes.into_iter().find(|(shape, shape_expected)| shape != shape_expected)
        {
            return Err(Error::MismatchedTensorShape(shape, shape_expected));
        }

        let is_require_grad = [
            self.cholesky.is_require_grad(),
            self.colors.is_require_grad(),
            self.features.is_require_grad(),
            self.positions.is_require_grad(),
        ];

        self.background = record.background;
        self.cholesky_bound = record.cholesky_bound;
        self.image_mean = record.image_mean;
        self.opacities = record.opacities;
        self.scale_factor = record.scale_factor;
        self.shift_factor = record.shift_factor;

        Ok(self
            .set_inner_cholesky(record.cholesky.set_require_grad(is_require_grad[0]))
            .set_inner_colors(record.colors.set_require_grad(is_require_grad[1]))
            .set_inner_features(record.features.set_require_grad(is_require_grad[2]))
            .set_inner_positions(record.positions.set_require_grad(is_require_grad[3])))
    }

    pub fn into_record(self) -> Gaussian2dBasisRecord<B> {
        Gaussian2dBasisRecord {
            background: self.background,
            cholesky: self.cholesky.val(),
            cholesky_bound: self.cholesky_bound,
            colors: self.colors.val(),
            features: self.features.val(),
            image_mean: self.image_mean,
            opacities: self.opacities,
            positions: self.positions.val(),
            scale_factor: self.scale_factor,
            shift_factor: self.shift_factor,
        }
    }

    /// Saving to the file at `path` (with the extension `.mpk`).
    pub fn save<P: Into<PathBuf>>(
        &self,
        path: P,
    ) -> Result<(), Error> {
        let path = path.into();

        Recorder::<B>::record(
            &Gaussian2dBasisRecorder::new(),
            self.to_owned().into_record(),
            path.to_owned(),
        )?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(target: "gausplat::basis::scene", "save > {path:?}");

        Ok(())
    }

    /// Loading from the file at `path` (with the extension `.mpk`).
    pub fn load<P: Into<PathBuf>>(
        path: P,
        device: &B::Device,
    ) -> Result<Self, Error> {
        let record: Gaussian2dBasisRecord<B> =
            Recorder::<B>::load(&Gaussian2dBasisRecorder::new(), path.into(), device)?;

        Ok(Self::from_record(record))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn load_record() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        let device = Default::default();
        let config = Gaussian2dBasisConfig::new(6, 2, 3, 3);
        let mut scene = config.init::<Autodiff<NdArray<f32>>>(&device);
        scene
            .set_require_grad_colors(true)
            .set_require_grad_features(false)
            .set_shift_factor(0.5);
        let positions_id = scene.positions.id.to_owned();

        let record = config
            .to_owned()
            .with_seed(1)
            .init::<Autodiff<NdArray<f32>>>(&device)
            .into_record();
        let positions = record.positions.to_owned().into_data();
        scene.load_record(record).unwrap();

        assert_eq!(scene.positions.id, positions_id);
        assert_eq!(scene.positions.val().into_data(), positions);
        assert_eq!(scene.shift_factor.to_owned().into_scalar(), 0.0);
        assert!(scene.colors.is_require_grad());
        assert!(!scene.features.is_require_grad());
    }

    #[test]
    fn load_record_of_other_image_size() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        let device = Default::default();
        let mut scene =
            Gaussian2dBasisConfig::new(6, 2, 4, 4).init::<Autodiff<NdArray<f32>>>(&device);
        scene.set_scale_factor(2.0);
        let positions = scene.positions.val().into_data();

        let record = Gaussian2dBasisConfig::new(6, 2, 3, 3)
            .with_seed(1)
            .init::<Autodiff<NdArray<f32>>>(&device)
            .into_record();
        let error = scene.load_record(record).unwrap_err();

        assert!(
            matches!(&error, Error::MismatchedTensorShape(shape, shape_expected)
                if shape == &[9] && shape_expected == &[16]),
            "{error:?}",
        );
        assert_eq!(scene.image_mean.dims(), [16]);
        assert_eq!(scene.positions.val().into_data(), positions);
        assert_eq!(scene.scale_factor.to_owned().into_scalar(), 2.0);
    }

    #[test]
    fn load_record_of_other_point_count() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let mut scene = Gaussian2dBasisConfig::new(6, 2, 3, 3).init::<NdArray<f32>>(&device);
        let record = Gaussian2dBasisConfig::new(5, 2, 3, 3)
            .init::<NdArray<f32>>(&device)
            .into_record();

        assert!(scene.load_record(record).is_err());
        assert_eq!(scene.point_count(), 6);
    }

    #[test]
    fn save_and_load() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let mut scene = Gaussian2dBasisConfig::new(6, 2, 3, 3).init::<NdArray<f32>>(&device);
        scene.set_scale_factor(2.0);

        let path = std::env::temp_dir()
            .join(format!("gausplat-basis-save-and-load-{}", std::process::id()));
        scene.save(&path).unwrap();

        let output = Gaussian2dBasis::<NdArray<f32>>::load(&path, &device).unwrap();
        std::fs::remove_file(path.with_extension("mpk")).unwrap();

        assert_eq!(output.scale_factor.into_scalar(), 2.0);
        assert_eq!(
            output.features.val().into_data(),
            scene.features.val().into_data()
        );
        assert_eq!(
            output.positions.val().into_data(),
            scene.positions.val().into_data()
        );

        Gaussian2dBasis::<NdArray<f32>>::load(path, &device).unwrap_err();
    }
}
