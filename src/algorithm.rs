// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Leaf disk assay measures how much of each leaf disk in a photograph has
//! turned necrotic after soaking in oxalic acid, and how that damage scales
//! with the acid concentration. Given an RGB image of disks laid out on white
//! paper, one row of disks per concentration, it returns the disks grouped
//! into rows with their necrotic portion and necrotic inner radius, and the
//! pixel labels needed to render an overlay.
//!
//! Features:
//!
//! * Finds dark regions by flood fill and merges fragments of the same disk.
//! * Rejects pen marks, labels and other non-circular regions by bounding box
//!   squareness and pixel count.
//! * Two alternative rules for calling a pixel necrotic (see below).
//! * Cross-checks the pixel count with a geometric measurement: the radius
//!   of the healthy core inside the necrotic ring.
//! * Dose-response regression of three necrotic rate measures against log
//!   concentration, see [crate::analyzer].
//!
//! # Algorithm
//!
//! The stages run in sequence, each taking ownership of the previous stage's
//! output:
//!
//! 1. Every pixel with all three channels below the dark threshold is dark.
//! 2. Dark pixels are gathered into 8-connected blobs; blobs whose bounding
//!    boxes overlap or touch are merged.
//! 3. Blobs that are tall enough, about as wide as they are tall, and about
//!    as full as the circle inscribed in their box are leaf disks.
//! 4. Disks are grouped into rows by vertical overlap and ordered top to
//!    bottom, left to right within a row.
//! 5. Each disk's necrotic pixels are labeled.
//! 6. A circle centered on each disk is shrunk from the disk's edge until
//!    at most half of its dark boundary is necrotic.
//!
//! # Necrosis rules
//!
//! The default rule calls a pixel necrotic when its red channel exceeds its
//! green channel, then removes thin features such as veins with a
//! neighborhood filter. The alternative sorts the disk's pixels by brightness
//! and calls everything past the dark/light transition necrotic; it assumes
//! exactly two tissue shades and is easily misled otherwise.
//!
//! The two rules are not interchangeable. Results obtained with one should
//! not be compared with results from the other.
//!
//! # Caveats
//!
//! ## Lighting and background
//!
//! The dark threshold is absolute. Disks must be photographed on a light,
//! evenly lit background; shadows darker than the threshold become blobs
//! and, where they touch a disk, distort its shape enough for it to be
//! rejected.
//!
//! ## Row layout
//!
//! By default a disk joins a row only if it overlaps the row's first disk
//! vertically. Rows that drift across the photo can split; use
//! [RowGrouping::Transitive](crate::config::RowGrouping::Transitive) to
//! group by chains of overlap instead.
//!
//! ## Degenerate images
//!
//! An image with no dark regions, or none that look like disks, is not an
//! error: the analysis completes with no rows and records why in
//! [LeafDiskAnalysis::segmentation_issue].

use std::time::Instant;

use image::RgbImage;
use log::{info, warn};

use crate::analyzer::{compute_susceptibility, SusceptibilityReport};
use crate::blob_funcs::{find_dark_blobs, Blob};
use crate::circle_funcs::refine_necrotic_radii;
use crate::config::{AssayConfig, AssayParameters, TransitionSmoothing};
use crate::disk_funcs::classify_blobs;
use crate::error::{AssayError, SegmentationIssue};
use crate::image_funcs::render_labeled_image;
use crate::necrosis::{label_necrosis, labeler_for, BrightnessProfile,
                      BrightnessTransitionLabeler};
use crate::pixel_field::PixelField;
use crate::row_funcs::{group_disks_into_rows, Row};

/// Outcome of running the segmentation and labeling stages on one image.
#[derive(Debug, Clone)]
pub struct LeafDiskAnalysis {
    /// The input pixels with their dark and necrotic flags set.
    pub field: PixelField,

    /// Leaf disks grouped into rows, top to bottom.
    pub rows: Vec<Row>,

    /// Dark blobs that did not qualify as leaf disks.
    pub other_blobs: Vec<Blob>,

    /// Set when no blobs, or no disks, were found. `rows` is then empty.
    pub segmentation_issue: Option<SegmentationIssue>,
}

impl LeafDiskAnalysis {
    /// Surfaces a degenerate segmentation as an error.
    pub fn check_segmentation(&self) -> Result<(), AssayError> {
        match self.segmentation_issue {
            Some(issue) => Err(issue.into()),
            None => Ok(()),
        }
    }

    pub fn disk_count(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    /// Dose-response regression over the rows. `concentrations` is parallel
    /// to `rows`. Can be called repeatedly, e.g. as concentrations are
    /// edited; the analysis is not modified.
    pub fn susceptibility(&self, params: &AssayParameters, concentrations: &[f64])
                          -> Result<SusceptibilityReport, AssayError> {
        compute_susceptibility(&self.rows, params, concentrations)
    }

    /// The labeled pixels with blob frames and necrotic inner circles.
    pub fn render(&self) -> RgbImage {
        render_labeled_image(&self.field, &self.rows, &self.other_blobs)
    }

    /// Sorted brightness profile of every disk, by row, for charting.
    pub fn brightness_profiles(&self, smoothing: &TransitionSmoothing)
                               -> Vec<Vec<BrightnessProfile>> {
        let labeler = BrightnessTransitionLabeler{smoothing: *smoothing};
        self.rows.iter()
            .map(|row| row.disks.iter()
                 .map(|disk| labeler.profile(disk, &self.field))
                 .collect())
            .collect()
    }
}

/// Decodes an encoded image (PNG, JPEG, ...) into RGB.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, AssayError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Runs the pipeline on encoded image bytes.
pub fn analyze_image_bytes(bytes: &[u8], config: &AssayConfig)
                           -> Result<LeafDiskAnalysis, AssayError> {
    analyze_leaf_disks(&decode_image(bytes)?, config)
}

/// Runs the pipeline on `image`. Fails only if the image has no pixels.
pub fn analyze_leaf_disks(image: &RgbImage, config: &AssayConfig)
                          -> Result<LeafDiskAnalysis, AssayError> {
    let field = PixelField::from_rgb_image(image)?;
    Ok(analyze_pixel_field(field, config))
}

/// Runs the pipeline on `field`, which must not already carry necrotic
/// labels.
pub fn analyze_pixel_field(mut field: PixelField, config: &AssayConfig)
                           -> LeafDiskAnalysis {
    let analysis_start = Instant::now();
    let (width, height) = field.dimensions();

    let blobs = find_dark_blobs(&mut field, config.dark_threshold);
    let blob_count = blobs.len();
    let (disks, other_blobs) = classify_blobs(blobs, &config.disk_criteria);

    let segmentation_issue = if blob_count == 0 {
        Some(SegmentationIssue::NoBlobs)
    } else if disks.is_empty() {
        Some(SegmentationIssue::NoDisks{blobs: blob_count})
    } else {
        None
    };
    if let Some(issue) = segmentation_issue {
        warn!("Segmentation of {}x{} image found nothing to measure: {}",
              width, height, issue);
    }

    let rows = group_disks_into_rows(disks, config.row_grouping);
    let labeler = labeler_for(&config.necrosis_method);
    let rows = label_necrosis(rows, &mut field, labeler.as_ref());
    let rows = refine_necrotic_radii(rows, &field, &config.circle_search);

    let analysis = LeafDiskAnalysis{field, rows, other_blobs, segmentation_issue};
    info!("Analyzed {}x{} image: {} disks in {} rows, {} other blobs in {:?}",
          width, height, analysis.disk_count(), analysis.rows.len(),
          analysis.other_blobs.len(), analysis_start.elapsed());
    analysis
}

// mod tests.
