pub use super::*;

use crate::function::get_vec_from_tensor;
use rayon::{iter::IndexedParallelIterator, iter::ParallelIterator, slice::ParallelSlice};

/// The Gaussians mapped to the pixel space.
#[derive(Clone, Debug)]
pub struct Projection<B: Backend> {
    /// The shape is `[P, 3]`
    ///
    /// The upper triangle of the inverse covariance, `(a, b, c)`.
    pub conics: Tensor<B, 2>,
    /// The shape is `[P]`
    ///
    /// They are all zeros in the plane.
    pub depths: Tensor<B, 1>,
    /// The shape is `[P, 2]`
    pub positions_2d: Tensor<B, 2>,
    /// The shape is `[P]`
    ///
    /// A zero radius means the Gaussian is culled.
    pub radii: Vec<u32>,
    pub tile_bounds: TileBounds,
    /// The shape is `[T_count][?]`
    ///
    /// The indices of the Gaussians touching each tile in row-major order.
    pub tile_point_indices: Vec<Vec<u32>>,
    /// The shape is `[P]`
    pub tile_touched_counts: Vec<u32>,
}

/// The tiles touched by a Gaussian, `min..max` on each axis.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TileRect {
    pub max: [u32; 2],
    pub min: [u32; 2],
}

impl TileRect {
    pub fn new(
        position_2d: [f32; 2],
        radius: f32,
        options: &RenderOptions,
    ) -> Self {
        let tile_bounds = options.tile_bounds();
        let tile_sizes = [options.tile_width.max(1), options.tile_height.max(1)];
        let tile_counts = [tile_bounds.count_x, tile_bounds.count_y];

        let mut rect = Self::default();
        for axis in 0..2 {
            let center = position_2d[axis] / tile_sizes[axis] as f32;
            let radius = radius / tile_sizes[axis] as f32;
            let count = tile_counts[axis] as i64;
            rect.min[axis] = ((center - radius) as i64).clamp(0, count) as u32;
            rect.max[axis] = ((center + radius + 1.0) as i64).clamp(0, count) as u32;
        }

        rect
    }

    #[inline]
    pub fn area(&self) -> u32 {
        (self.max[0] - self.min[0]) * (self.max[1] - self.min[1])
    }
}

/// Projecting the Gaussians to the pixel space.
///
/// ## Arguments
///
/// * `positions` - The normalized positions with shape `[P, 2]`, ranging from `-1.0` to `1.0`.
/// * `cholesky` - The lower-triangular factors `(l_1, l_2, l_3)` with shape `[P, 3]`.
///
/// ## Details
///
/// * `S = L * L^T` where `L = [[l_1, 0], [l_2, l_3]]`
/// * `r = ceil(3 * sqrt(max eigenvalue of S))`
/// * The Gaussians with a singular covariance or no touched tiles are culled.
pub fn project<B: Backend>(
    positions: Tensor<B, 2>,
    cholesky: Tensor<B, 2>,
    options: &RenderOptions,
) -> Result<Projection<B>, Error> {
    let [point_count, _] = positions.dims();
    let device = positions.device();
    let tile_bounds = options.tile_bounds();

    debug_assert_eq!(positions.dims(), [point_count, 2]);
    debug_assert_eq!(cholesky.dims(), [point_count, 3]);

    // Slicing an empty tensor is rejected by the backend
    if point_count == 0 {
        return Ok(Projection {
            conics: Tensor::zeros([0, 3], &device),
            depths: Tensor::zeros([0], &device),
            positions_2d: Tensor::zeros([0, 2], &device),
            radii: vec![],
            tile_bounds,
            tile_point_indices: vec![Vec::new(); tile_bounds.tile_count()],
            tile_touched_counts: vec![],
        });
    }

    // [1, 2]
    let image_size = Tensor::<B, 2>::from_floats(
        [[options.image_width as f32, options.image_height as f32]],
        &device,
    );

    // [P, 2] <- ([P, 2] + 1) * [1, 2] / 2
    let positions_2d = positions
        .add_scalar(1.0)
        .mul(image_size.expand([point_count, 2]))
        .mul_scalar(0.5);

    // [P, 1] * 3
    let l_1 = cholesky.to_owned().slice([0..point_count, 0..1]);
    let l_2 = cholesky.to_owned().slice([0..point_count, 1..2]);
    let l_3 = cholesky.slice([0..point_count, 2..3]);

    // [P, 1] * 3 <- [[a, b], [b, c]] = L * L^T
    let covariance_a = l_1.to_owned() * l_1.to_owned();
    let covariance_b = l_1 * l_2.to_owned();
    let covariance_c = l_2.to_owned() * l_2 + l_3.to_owned() * l_3;

    // [P, 1]
    let determinants = covariance_a.to_owned() * covariance_c.to_owned()
        - covariance_b.to_owned() * covariance_b.to_owned();
    let is_singular = determinants.to_owned().equal_elem(0.0);
    let determinants = determinants.mask_fill(is_singular, 1.0);

    // [P, 3] <- [[c, -b], [-b, a]] / det
    let conics = Tensor::cat(
        vec![
            covariance_c.to_owned() / determinants.to_owned(),
            covariance_b.to_owned().neg() / determinants.to_owned(),
            covariance_a.to_owned() / determinants,
        ],
        1,
    );

    // Computing the bounds on the host

    let covariances = get_vec_from_tensor(Tensor::cat(
        vec![covariance_a, covariance_b, covariance_c],
        1,
    ))?;
    let positions_2d_host = get_vec_from_tensor(positions_2d.to_owned())?;

    let bounds = covariances
        .par_chunks_exact(3)
        .zip(positions_2d_host.par_chunks_exact(2))
        .map(|(covariance, position_2d)| {
            get_bound(
                [covariance[0], covariance[1], covariance[2]],
                [position_2d[0], position_2d[1]],
                options,
            )
        })
        .collect::<Vec<_>>();

    let mut radii = vec![0; point_count];
    let mut tile_touched_counts = vec![0; point_count];
    let mut tile_point_indices = vec![Vec::new(); tile_bounds.tile_count()];

    for (point_index, bound) in bounds.into_iter().enumerate() {
        let Some((radius, rect)) = bound else {
            continue;
        };

        radii[point_index] = radius;
        tile_touched_counts[point_index] = rect.area();

        for tile_y in rect.min[1]..rect.max[1] {
            for tile_x in rect.min[0]..rect.max[0] {
                let tile_index = (tile_y * tile_bounds.count_x + tile_x) as usize;
                tile_point_indices[tile_index].push(point_index as u32);
            }
        }
    }

    #[cfg(all(debug_assertions, not(test)))]
    log::debug!(
        target: "gausplat::basis::render::project",
        "point_count ({}) > visible ({}) > tile_touched ({})",
        point_count,
        radii.iter().filter(|r| **r != 0).count(),
        tile_touched_counts.iter().map(|c| *c as u64).sum::<u64>(),
    );

    Ok(Projection {
        conics,
        depths: Tensor::zeros([point_count], &device),
        positions_2d,
        radii,
        tile_bounds,
        tile_point_indices,
        tile_touched_counts,
    })
}

/// ## Returns
///
/// `None` if the Gaussian should be culled, otherwise the radius and the touched tiles.
pub fn get_bound(
    covariance: [f32; 3],
    position_2d: [f32; 2],
    options: &RenderOptions,
) -> Option<(u32, TileRect)> {
    let [a, b, c] = covariance;
    let determinant = a * c - b * b;
    if determinant == 0.0 || !determinant.is_finite() {
        return None;
    }

    let middle = 0.5 * (a + c);
    let eigenvalue_max = middle + (middle * middle - determinant).max(0.1).sqrt();
    let radius = (3.0 * eigenvalue_max.sqrt()).ceil();

    let rect = TileRect::new(position_2d, radius, options);
    if rect.area() == 0 {
        return None;
    }

    Some((radius as u32, rect))
}
