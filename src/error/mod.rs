pub use crate::train::gaussian_2d::OptimizationPhase;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image file path: {0:?}")]
    InvalidImageFilePath(PathBuf),

    #[error("Invalid tensor data: {0}")]
    InvalidTensorData(String),

    #[error("Duplicate image file name: {0}")]
    DuplicateImageFileName(String),

    #[error("Mismatched image size: {0:?} (expected {1:?})")]
    MismatchedImageSize([u32; 2], [u32; 2]),

    #[error("Mismatched optimization phase: {0:?} (expected {1:?})")]
    MismatchedOptimizationPhase(OptimizationPhase, OptimizationPhase),

    #[error("Mismatched tensor shape: {0:?} (expected {1:?})")]
    MismatchedTensorShape(Vec<usize>, Vec<usize>),

    #[error("Record error: {0:?}")]
    Record(#[from] burn::record::RecorderError),

    #[error("Unknown image file name: {0}")]
    UnknownImageFileName(String),
}
