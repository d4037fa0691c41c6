// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Quantifies necrosis in leaf disks soaked in oxalic acid, and fits how the
//! necrotic rate responds to acid concentration. See [algorithm] for an
//! overview of the pipeline.

pub mod algorithm;
pub mod analyzer;
pub mod blob_funcs;
pub mod circle_funcs;
pub mod config;
pub mod disk_funcs;
pub mod error;
pub mod histogram_funcs;
pub mod image_funcs;
pub mod necrosis;
pub mod pixel_field;
pub mod regression;
pub mod row_funcs;

pub use algorithm::{analyze_image_bytes, analyze_leaf_disks, analyze_pixel_field,
                    LeafDiskAnalysis};
pub use analyzer::{compute_susceptibility, Measure, SusceptibilityReport};
pub use config::{AssayConfig, AssayParameters};
pub use error::{AssayError, SegmentationIssue};
