pub mod gaussian_2d;
