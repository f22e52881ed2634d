pub use burn::tensor::{backend::Backend, Tensor, TensorData};
pub use image::RgbImage;

use crate::error::Error;

/// Converting the RGB image to a tensor.
///
/// ## Returns
///
/// The normalized colors with shape `[3, H, W]`, ranging from `0.0` to `1.0`.
pub fn get_tensor_from_image<B: Backend>(
    image: &RgbImage,
    device: &B::Device,
) -> Tensor<B, 3> {
    let (width, height) = image.dimensions();
    let data = TensorData::new(
        image.as_raw().to_owned(),
        [height as usize, width as usize, 3],
    )
    .convert::<B::FloatElem>();

    // [H, W, 3] -> [3, H, W]
    Tensor::<B, 3>::from_data(data, device)
        .div_scalar(255.0)
        .swap_dims(0, 2)
        .swap_dims(1, 2)
}

/// Converting the tensor with shape `[3, H, W]` to an RGB image.
///
/// The values are clamped to the range of `0.0` to `1.0` before quantization.
pub fn get_image_from_tensor<B: Backend>(
    tensor: Tensor<B, 3>
) -> Result<RgbImage, Error> {
    let [channel_count, height, width] = tensor.dims();
    if channel_count != 3 {
        return Err(Error::MismatchedTensorShape(
            tensor.dims().into(),
            vec![3, height, width],
        ));
    }

    // [3, H, W] -> [H, W, 3]
    let colors = get_vec_from_tensor(
        tensor.clamp(0.0, 1.0).swap_dims(1, 2).swap_dims(0, 2),
    )?
    .into_iter()
    .map(|color| (color * 255.0).round() as u8)
    .collect();

    RgbImage::from_raw(width as u32, height as u32, colors).ok_or_else(|| {
        Error::MismatchedTensorShape(vec![height, width, 3], vec![height, width, 3])
    })
}

/// Reading the values of the tensor in row-major order.
pub fn get_vec_from_tensor<B: Backend, const D: usize>(
    tensor: Tensor<B, D>
) -> Result<Vec<f32>, Error> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|error| Error::InvalidTensorData(format!("{error:?}")))
}

#[cfg(test)]
mod tests {
    #[test]
    fn get_tensor_from_image() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let image = RgbImage::from_raw(
            2,
            1,
            vec![255, 0, 51, 0, 102, 255],
        )
        .unwrap();

        let tensor = super::get_tensor_from_image::<NdArray<f32>>(&image, &device);
        assert_eq!(tensor.dims(), [3, 1, 2]);

        let target = TensorData::from([[[1.0, 0.0]], [[0.0, 0.4]], [[0.2, 1.0]]]);
        tensor.into_data().assert_approx_eq(&target, 5);
    }

    #[test]
    fn get_image_from_tensor() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let tensor = Tensor::<NdArray<f32>, 3>::from_floats(
            [[[1.5, 0.0]], [[-1.0, 0.4]], [[0.2, 1.0]]],
            &device,
        );

        let image = super::get_image_from_tensor(tensor).unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.as_raw(), &vec![255, 0, 51, 0, 102, 255]);

        let tensor = Tensor::<NdArray<f32>, 3>::zeros([1, 2, 2], &device);
        super::get_image_from_tensor(tensor).unwrap_err();
    }

    #[test]
    fn get_image_from_tensor_from_image() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let image = RgbImage::from_fn(5, 3, |x, y| {
            image::Rgb([(x * 40) as u8, (y * 90) as u8, (x * y * 10) as u8])
        });

        let tensor = super::get_tensor_from_image::<NdArray<f32>>(&image, &device);
        let output = super::get_image_from_tensor(tensor).unwrap();
        assert_eq!(output, image);
    }
}
