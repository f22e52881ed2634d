pub use super::*;

use std::ops::Range;

/// The maximum opacity of a Gaussian at a pixel.
pub const ALPHA_MAX: f64 = 0.999;

/// The minimum opacity for a Gaussian to contribute to a pixel.
pub const ALPHA_MIN: f64 = 1.0 / 255.0;

/// Rasterizing the projected Gaussians by summing the weighted colors.
///
/// ## Arguments
///
/// * `projection` - The output of [`project`].
/// * `colors` - The colors with shape `[P, C]`.
/// * `opacities` - The opacities with shape `[P, 1]`.
///
/// ## Returns
///
/// The image with shape `[I_y, I_x, C]`.
///
/// ## Details
///
/// For each pixel `(x, y)` and each Gaussian `i` binned in the pixel's tile:
///
/// * `d = p_i - (x, y)`
/// * `s = (c_0 * d_x^2 + c_2 * d_y^2) / 2 + c_1 * d_x * d_y`
/// * `a = min(o_i * exp(-s), 0.999)`, skipped if `s < 0` or `a < 1 / 255`
/// * `I(x, y) = sum(a * color_i)`
///
/// There is no transmittance, so the background is never composited.
pub fn rasterize_sum<B: Backend>(
    projection: &Projection<B>,
    colors: Tensor<B, 2>,
    opacities: Tensor<B, 2>,
    options: &RenderOptions,
) -> Tensor<B, 3> {
    let [point_count, channel_count] = colors.dims();
    let device = colors.device();
    let image_height = options.image_height as usize;
    let image_width = options.image_width as usize;
    let tile_height = options.tile_height.max(1) as usize;
    let tile_width = options.tile_width.max(1) as usize;
    let TileBounds { count_x, count_y } = projection.tile_bounds;

    debug_assert_eq!(opacities.dims(), [point_count, 1]);
    debug_assert_eq!(projection.radii.len(), point_count);

    if image_height == 0 || image_width == 0 {
        return Tensor::zeros([image_height, image_width, channel_count], &device);
    }

    // [I_y, I_x, C] <- [T_y, T_x][t_y, t_x, C]
    let rows = (0..count_y as usize)
        .map(|tile_y| {
            let range_y = tile_y * tile_height..((tile_y + 1) * tile_height).min(image_height);
            let tiles = (0..count_x as usize)
                .map(|tile_x| {
                    let range_x =
                        tile_x * tile_width..((tile_x + 1) * tile_width).min(image_width);
                    let point_indices =
                        &projection.tile_point_indices[tile_y * count_x as usize + tile_x];

                    rasterize_tile_sum(
                        projection,
                        &colors,
                        &opacities,
                        point_indices,
                        range_x,
                        range_y.to_owned(),
                    )
                })
                .collect::<Vec<_>>();

            Tensor::cat(tiles, 1)
        })
        .collect::<Vec<_>>();

    Tensor::cat(rows, 0)
}

/// ## Returns
///
/// The tile with shape `[t_y, t_x, C]`.
fn rasterize_tile_sum<B: Backend>(
    projection: &Projection<B>,
    colors: &Tensor<B, 2>,
    opacities: &Tensor<B, 2>,
    point_indices: &[u32],
    range_x: Range<usize>,
    range_y: Range<usize>,
) -> Tensor<B, 3> {
    let [_, channel_count] = colors.dims();
    let device = colors.device();
    let tile_size = [range_y.len(), range_x.len()];
    let pixel_count = tile_size[0] * tile_size[1];
    let point_count = point_indices.len();

    if point_count == 0 {
        return Tensor::zeros([tile_size[0], tile_size[1], channel_count], &device);
    }

    // [T]
    let point_indices = Tensor::<B, 1, Int>::from_data(
        TensorData::new(
            point_indices.iter().map(|&i| i as i64).collect::<Vec<_>>(),
            [point_count],
        )
        .convert::<B::IntElem>(),
        &device,
    );

    // [T, 2], [T, 3], [T, C], [T, 1]
    let positions_2d = projection
        .positions_2d
        .to_owned()
        .select(0, point_indices.to_owned());
    let conics = projection
        .conics
        .to_owned()
        .select(0, point_indices.to_owned());
    let colors = colors.to_owned().select(0, point_indices.to_owned());
    let opacities = opacities.to_owned().select(0, point_indices);

    // [S, T] <- [1, T]
    let get_column = |tensor: &Tensor<B, 2>, index: usize| {
        tensor
            .to_owned()
            .slice([0..point_count, index..index + 1])
            .transpose()
            .expand([pixel_count, point_count])
    };

    // [S, T] <- [S, 1]
    let (pixels_x, pixels_y): (Vec<f32>, Vec<f32>) = range_y
        .flat_map(|y| range_x.to_owned().map(move |x| (x as f32, y as f32)))
        .unzip();
    let pixels_x = Tensor::<B, 2>::from_data(
        TensorData::new(pixels_x, [pixel_count, 1]).convert::<B::FloatElem>(),
        &device,
    )
    .expand([pixel_count, point_count]);
    let pixels_y = Tensor::<B, 2>::from_data(
        TensorData::new(pixels_y, [pixel_count, 1]).convert::<B::FloatElem>(),
        &device,
    )
    .expand([pixel_count, point_count]);

    // [S, T]
    let deltas_x = get_column(&positions_2d, 0) - pixels_x;
    let deltas_y = get_column(&positions_2d, 1) - pixels_y;

    // [S, T]
    let sigmas_diagonal = get_column(&conics, 0) * deltas_x.to_owned() * deltas_x.to_owned()
        + get_column(&conics, 2) * deltas_y.to_owned() * deltas_y.to_owned();
    let sigmas =
        sigmas_diagonal.mul_scalar(0.5) + get_column(&conics, 1) * deltas_x * deltas_y;

    // [S, T]
    let alphas = (get_column(&opacities, 0) * sigmas.to_owned().neg().exp())
        .clamp_max(ALPHA_MAX)
        .mask_fill(sigmas.lower_elem(0.0), 0.0);
    let alphas = alphas.to_owned().mask_fill(alphas.lower_elem(ALPHA_MIN), 0.0);

    // [t_y, t_x, C] <- [S, C] = [S, T] * [T, C]
    alphas
        .matmul(colors)
        .reshape([tile_size[0], tile_size[1], channel_count])
}

#[cfg(test)]
mod tests {
    #[test]
    fn rasterize_sum_single_point() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(8, 8).with_tile_height(4).with_tile_width(4);

        // p = (4, 4), S = I
        let positions = Tensor::<NdArray<f32>, 2>::from_floats([[0.0, 0.0]], &device);
        let cholesky = Tensor::from_floats([[1.0, 0.0, 1.0]], &device);
        let colors = Tensor::from_floats([[1.0, 0.5, 0.0]], &device);
        let opacities = Tensor::ones([1, 1], &device);

        let projection = project(positions, cholesky, &options).unwrap();
        let image = rasterize_sum(&projection, colors, opacities, &options);
        assert_eq!(image.dims(), [8, 8, 3]);

        let pixel = image.to_owned().slice([4..5, 4..5, 0..3]).reshape([3]);
        pixel
            .into_data()
            .assert_approx_eq(&TensorData::from([0.999, 0.4995, 0.0]), 4);

        // s = 1 / 2 at (x, y) = (5, 4)
        let target = (-0.5_f32).exp();
        let pixel = image.to_owned().slice([4..5, 5..6, 0..1]).into_scalar();
        assert!((pixel - target).abs() < 1e-5, "{pixel} != {target}");

        // s = 8 at (x, y) = (0, 4), so the alpha is less than 1 / 255
        let pixel = image.slice([4..5, 0..1, 0..1]).into_scalar();
        assert_eq!(pixel, 0.0);
    }

    #[test]
    fn rasterize_sum_additive() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(6, 10).with_tile_height(4).with_tile_width(4);

        let positions = Tensor::<NdArray<f32>, 2>::from_floats(
            [[-0.3, 0.2], [0.1, -0.1], [0.6, 0.5]],
            &device,
        );
        let cholesky = Tensor::from_floats(
            [[1.5, 0.2, 1.0], [0.8, -0.3, 1.2], [2.0, 0.0, 0.6]],
            &device,
        );
        let colors = Tensor::from_floats(
            [[1.0, 0.0, 0.2], [0.0, 1.0, 0.4], [0.3, 0.3, 0.3]],
            &device,
        );
        let opacities = Tensor::from_floats([[1.0], [0.5], [0.8]], &device);

        let projection =
            project(positions.to_owned(), cholesky.to_owned(), &options).unwrap();
        let image = rasterize_sum(
            &projection,
            colors.to_owned(),
            opacities.to_owned(),
            &options,
        );
        assert_eq!(image.dims(), [6, 10, 3]);

        let image_sum = (0..3)
            .map(|i| {
                let projection = project(
                    positions.to_owned().slice([i..i + 1, 0..2]),
                    cholesky.to_owned().slice([i..i + 1, 0..3]),
                    &options,
                )
                .unwrap();
                rasterize_sum(
                    &projection,
                    colors.to_owned().slice([i..i + 1, 0..3]),
                    opacities.to_owned().slice([i..i + 1, 0..1]),
                    &options,
                )
            })
            .reduce(|a, b| a + b)
            .unwrap();

        image.into_data().assert_approx_eq(&image_sum.into_data(), 5);
    }

    #[test]
    fn rasterize_sum_empty() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();
        let options = RenderOptions::new(5, 7);

        let positions = Tensor::<NdArray<f32>, 2>::from_floats([[10.0, 10.0]], &device);
        let cholesky = Tensor::from_floats([[1.0, 0.0, 1.0]], &device);
        let colors = Tensor::ones([1, 2], &device);
        let opacities = Tensor::ones([1, 1], &device);

        let projection = project(positions, cholesky, &options).unwrap();
        assert_eq!(projection.radii, vec![0]);

        let image = rasterize_sum(&projection, colors, opacities, &options);
        assert_eq!(image.dims(), [5, 7, 2]);
        assert_eq!(image.sum().into_scalar(), 0.0);
    }

    #[test]
    fn rasterize_sum_backward() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        type AB = Autodiff<NdArray<f32>>;

        let device = Default::default();
        let options = RenderOptions::new(16, 16).with_tile_height(8).with_tile_width(8);

        let positions = Tensor::<AB, 2>::from_floats([[0.1, -0.2], [-0.4, 0.3]], &device)
            .require_grad();
        let cholesky =
            Tensor::<AB, 2>::from_floats([[2.0, 0.5, 1.5], [1.0, 0.0, 1.0]], &device)
                .require_grad();
        let colors =
            Tensor::<AB, 2>::from_floats([[1.0, 0.2, 0.3], [0.1, 0.9, 0.5]], &device)
                .require_grad();
        let opacities = Tensor::<AB, 2>::ones([2, 1], &device);

        let projection = project(positions.to_owned(), cholesky.to_owned(), &options).unwrap();
        let image = rasterize_sum(&projection, colors.to_owned(), opacities, &options);
        let mut grads = image.sum().backward();

        let grad_positions = positions.grad_remove(&mut grads).unwrap();
        let grad_cholesky = cholesky.grad_remove(&mut grads).unwrap();
        let grad_colors = colors.grad_remove(&mut grads).unwrap();

        assert_eq!(grad_positions.dims(), [2, 2]);
        assert_eq!(grad_cholesky.dims(), [2, 3]);
        assert_eq!(grad_colors.dims(), [2, 3]);

        // The gradient of a sum over colors is the summed weights
        let grad_colors = grad_colors.into_data().to_vec::<f32>().unwrap();
        assert!(grad_colors.iter().all(|g| *g > 0.0), "{grad_colors:?}");
        assert!((grad_colors[0] - grad_colors[1]).abs() < 1e-5, "{grad_colors:?}");
        assert!((grad_colors[3] - grad_colors[5]).abs() < 1e-5, "{grad_colors:?}");

        let grad_cholesky = grad_cholesky.into_data().to_vec::<f32>().unwrap();
        assert!(grad_cholesky.iter().all(|g| g.is_finite()), "{grad_cholesky:?}");
        assert!(grad_cholesky.iter().any(|g| *g != 0.0), "{grad_cholesky:?}");
    }
}
