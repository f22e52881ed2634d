pub use crate::{error::Error, function::*};
pub use dashmap::DashMap;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// The extensions of the image files to look up in a directory.
pub const IMAGE_FILE_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];

/// The RGB images keyed by their file names.
#[derive(Clone, Default)]
pub struct ImageDataset {
    pub images: DashMap<String, RgbImage>,
}

impl ImageDataset {
    /// Decoding the image files in parallel.
    ///
    /// The file names should be unique.
    pub fn init_from_paths<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Self, Error> {
        let images = DashMap::with_capacity(paths.len());

        paths.par_iter().try_for_each(|path| {
            let path = path.as_ref();
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| Error::InvalidImageFilePath(path.to_owned()))?
                .to_owned();
            let image = image::open(path)?.into_rgb8();

            match images.insert(file_name.to_owned(), image) {
                Some(_) => Err(Error::DuplicateImageFileName(file_name)),
                None => Ok(()),
            }
        })?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::basis::dataset",
            "ImageDataset::init_from_paths > {} images",
            images.len(),
        );

        Ok(Self { images })
    }

    /// Decoding the image files directly under the directory.
    ///
    /// Only the files with [`IMAGE_FILE_EXTENSIONS`] are decoded.
    pub fn init_from_directory<P: AsRef<Path>>(directory: P) -> Result<Self, Error> {
        let paths = std::fs::read_dir(directory)?
            .map(|entry| Ok(entry?.path()))
            .collect::<Result<Vec<PathBuf>, Error>>()?
            .into_iter()
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|extension| extension.to_str())
                        .is_some_and(|extension| {
                            IMAGE_FILE_EXTENSIONS
                                .contains(&extension.to_ascii_lowercase().as_str())
                        })
            })
            .collect::<Vec<_>>();

        Self::init_from_paths(&paths)
    }

    /// The sorted file names.
    pub fn file_names(&self) -> Vec<String> {
        let mut file_names = self
            .images
            .iter()
            .map(|entry| entry.key().to_owned())
            .collect::<Vec<_>>();
        file_names.sort();
        file_names
    }

    /// The shared size `[I_y, I_x]` of the images.
    ///
    /// It is `None` if the dataset is empty.
    pub fn image_size(&self) -> Result<Option<[u32; 2]>, Error> {
        let mut image_size = None;

        for file_name in self.file_names() {
            let size = self
                .images
                .get(&file_name)
                .map(|image| [image.height(), image.width()])
                .ok_or_else(|| Error::UnknownImageFileName(file_name.to_owned()))?;

            match image_size {
                None => image_size = Some(size),
                Some(image_size) if image_size != size => {
                    return Err(Error::MismatchedImageSize(size, image_size));
                },
                _ => {},
            }
        }

        Ok(image_size)
    }

    pub fn insert(
        &self,
        file_name: String,
        image: RgbImage,
    ) -> Option<RgbImage> {
        self.images.insert(file_name, image)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// ## Returns
    ///
    /// The image with shape `[3, I_y, I_x]`, ranging from `0.0` to `1.0`.
    pub fn get_tensor<B: Backend>(
        &self,
        file_name: &str,
        device: &B::Device,
    ) -> Result<Tensor<B, 3>, Error> {
        let image = self
            .images
            .get(file_name)
            .ok_or_else(|| Error::UnknownImageFileName(file_name.to_owned()))?;

        Ok(get_tensor_from_image(image.value(), device))
    }

    /// Stacking the images in the order of the file names.
    ///
    /// ## Returns
    ///
    /// The images with shape `[N, 3, I_y, I_x]`.
    pub fn get_tensors<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Tensor<B, 4>, Error> {
        let [image_height, image_width] = self.image_size()?.unwrap_or_default();

        let tensors = self
            .file_names()
            .iter()
            .map(|file_name| self.get_tensor(file_name, device))
            .collect::<Result<Vec<_>, Error>>()?;

        if tensors.is_empty() {
            return Ok(Tensor::zeros(
                [0, 3, image_height as usize, image_width as usize],
                device,
            ));
        }

        Ok(Tensor::stack(tensors, 0))
    }

    /// Encoding the image with shape `[3, I_y, I_x]` to the file at `path`.
    ///
    /// The format is deduced from the extension.
    pub fn save_tensor<B: Backend, P: AsRef<Path>>(
        tensor: Tensor<B, 3>,
        path: P,
    ) -> Result<(), Error> {
        get_image_from_tensor(tensor)?.save(path.as_ref())?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::basis::dataset",
            "ImageDataset::save_tensor > {:?}",
            path.as_ref(),
        );

        Ok(())
    }
}

impl fmt::Debug for ImageDataset {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ImageDataset")
            .field("file_names", &self.file_names())
            .field("image_size", &self.image_size().ok().flatten())
            .finish()
    }
}
