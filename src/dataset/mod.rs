//! The target images to fit.

pub mod images;

pub use images::*;
