//! A library to fit images with 2D Gaussian bases for `gausplat`

#![deny(rustdoc::broken_intra_doc_links)]
#![allow(clippy::excessive_precision)]

pub mod dataset;
pub mod error;
pub mod function;
pub mod metric;
pub mod optimize;
pub mod range;
pub mod render;
pub mod scene;
pub mod train;
