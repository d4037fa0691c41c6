// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Tunable constants of the assay pipeline. The defaults come from bench
//! photographs of 5/8" leaf disks on white paper; other setups (lighting,
//! camera, disk size) may need different values.

/// All three RGB channels must be below this value for a pixel to count as
/// dark. Leaf tissue, both healthy and necrotic, is well below it; white
/// paper is well above.
pub const DEFAULT_DARK_THRESHOLD: u8 = 150;

/// Shape gates used to decide whether a blob is a leaf disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskCriteria {
    /// Maximum relative difference between bounding box height and width.
    pub squareness_tolerance: f64,

    /// Maximum relative difference between the blob's pixel count and the
    /// area of a circle inscribed in its bounding box.
    pub pixel_count_tolerance: f64,

    /// Blobs whose bounding box height (bottom - top) does not exceed this
    /// are rejected. Filters pen marks and labels. Zero disables the gate.
    pub min_disk_height: u32,
}

impl Default for DiskCriteria {
    fn default() -> Self {
        DiskCriteria{squareness_tolerance: 0.05,
                     pixel_count_tolerance: 0.05,
                     min_disk_height: 20}
    }
}

/// How disks are clustered into rows by vertical overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowGrouping {
    /// A disk joins the first row whose first disk overlaps it vertically.
    /// Overlap with later members of the row is not considered.
    #[default]
    FirstMember,

    /// Rows are the connected components of the vertical-overlap relation:
    /// a disk joins a row if it overlaps any member, and rows that become
    /// linked through a disk are combined.
    Transitive,
}

/// Neighborhood filter that removes thin necrotic-colored features (veins)
/// from the channel-threshold labeling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VeinSuppression {
    /// Half size of the square neighborhood; 5 gives an 11x11 box.
    pub radius: u32,

    /// A necrotic pixel whose neighborhood is less than this fraction
    /// necrotic is unmarked.
    pub min_fraction: f64,

    /// Maximum number of filter passes. Stops early once a pass changes
    /// nothing.
    pub passes: u32,
}

impl Default for VeinSuppression {
    fn default() -> Self {
        VeinSuppression{radius: 5, min_fraction: 0.33, passes: 5}
    }
}

/// Smoothing factors for locating the healthy/necrotic brightness
/// transition. Each factor is the window length as a fraction of the
/// series being differentiated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSmoothing {
    /// Window for the slope of the sorted brightness sequence.
    pub slope: f64,

    /// Window for the derivative of that slope series.
    pub peak: f64,

    /// Window for the final derivative whose minimum marks the peak.
    pub trough: f64,

    /// The first derivative is sampled at about this many points,
    /// regardless of disk size.
    pub target_samples: usize,
}

impl Default for TransitionSmoothing {
    fn default() -> Self {
        TransitionSmoothing{slope: 0.05, peak: 0.05, trough: 0.01,
                            target_samples: 500}
    }
}

/// Which rule decides that a disk pixel is necrotic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NecrosisMethod {
    /// Red exceeds green, followed by vein suppression.
    ChannelThreshold(VeinSuppression),

    /// Pixels brighter than the disk's brightness transition point.
    BrightnessTransition(TransitionSmoothing),
}

impl Default for NecrosisMethod {
    fn default() -> Self {
        NecrosisMethod::ChannelThreshold(VeinSuppression::default())
    }
}

/// Parameters of the inner necrotic circle search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleSearch {
    /// Number of equally spaced angles sampled on each probe circle.
    pub samples: usize,

    /// The circle keeps shrinking while the necrotic share of its dark
    /// boundary pixels exceeds this.
    pub majority: f64,
}

impl Default for CircleSearch {
    fn default() -> Self {
        CircleSearch{samples: 1000, majority: 0.5}
    }
}

/// Configuration of one pipeline run, from segmentation through circle
/// refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssayConfig {
    pub dark_threshold: u8,
    pub disk_criteria: DiskCriteria,
    pub row_grouping: RowGrouping,
    pub necrosis_method: NecrosisMethod,
    pub circle_search: CircleSearch,
}

impl Default for AssayConfig {
    fn default() -> Self {
        AssayConfig{dark_threshold: DEFAULT_DARK_THRESHOLD,
                    disk_criteria: DiskCriteria::default(),
                    row_grouping: RowGrouping::default(),
                    necrosis_method: NecrosisMethod::default(),
                    circle_search: CircleSearch::default()}
    }
}

/// Physical scalars of an assay, entered by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssayParameters {
    /// Diameter of the cork borer used to cut the disks, e.g. in mm.
    pub disk_diameter: f64,

    /// Time the disks spent in the oxalic acid bath.
    pub hours_soaked: f64,
}

impl AssayParameters {
    /// Area of one disk, in the square of the diameter's unit.
    pub fn disk_area(&self) -> f64 {
        let radius = self.disk_diameter / 2.0;
        std::f64::consts::PI * radius * radius
    }
}
