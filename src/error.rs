// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use crate::regression::RegressionError;

/// Why segmentation produced nothing to measure. This is not fatal: the
/// pipeline still completes with an empty row set, and the caller decides
/// whether to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SegmentationIssue {
    #[error("no dark regions found in the image")]
    NoBlobs,

    #[error("{blobs} dark regions found but none are leaf disks")]
    NoDisks { blobs: usize },
}

/// Errors surfaced to callers of the assay pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AssayError {
    /// The input could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The image has no pixels.
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The raw sample buffer does not match the stated dimensions.
    #[error("{len} bytes do not form a {width}x{height} RGB image")]
    NonRectangular { width: u32, height: u32, len: usize },

    /// No blobs, or no leaf disks, were found.
    #[error("no leaf disks detected: {0}")]
    SegmentationDegenerate(#[from] SegmentationIssue),

    /// A dose-response line could not be fitted.
    #[error("regression undefined: {0}")]
    Regression(#[from] RegressionError),

    /// A user supplied scalar cannot be used.
    #[error("invalid assay parameter: {0}")]
    InvalidParameter(String),
}
