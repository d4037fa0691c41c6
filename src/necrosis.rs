// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use log::{debug, info};

use crate::config::{NecrosisMethod, TransitionSmoothing, VeinSuppression};
use crate::disk_funcs::Disk;
use crate::histogram_funcs::find_transition_index;
use crate::pixel_field::{Coord, PixelField};
use crate::row_funcs::Row;

/// Decides which pixels of a disk are necrotic.
pub trait NecrosisLabeler {
    /// Returns the necrotic subset of `disk`'s pixel coordinates, without
    /// duplicates. Does not modify the field.
    fn label(&self, disk: &Disk, field: &PixelField) -> Vec<Coord>;
}

/// Returns the labeler implementing `method`.
pub fn labeler_for(method: &NecrosisMethod) -> Box<dyn NecrosisLabeler> {
    match *method {
        NecrosisMethod::ChannelThreshold(vein_suppression) =>
            Box::new(ChannelThresholdLabeler{vein_suppression}),
        NecrosisMethod::BrightnessTransition(smoothing) =>
            Box::new(BrightnessTransitionLabeler{smoothing}),
    }
}

/// Labels every disk of `rows` with `labeler`, recording the necrotic
/// coordinates and portion on each disk and setting the field's necrotic
/// flags.
pub fn label_necrosis(mut rows: Vec<Row>, field: &mut PixelField,
                      labeler: &dyn NecrosisLabeler) -> Vec<Row> {
    let label_start = Instant::now();
    let mut disk_count = 0;
    for (row_index, row) in rows.iter_mut().enumerate() {
        for (disk_index, disk) in row.disks.iter_mut().enumerate() {
            let necrotic = labeler.label(disk, field);
            for coord in &necrotic {
                if let Some(pixel) = field.get_mut(*coord) {
                    pixel.is_necrotic = true;
                }
            }
            disk.necrotic_portion = if disk.blob.pixel_count() == 0 {
                0.0
            } else {
                necrotic.len() as f64 / disk.blob.pixel_count() as f64
            };
            disk.necrotic_coordinates = necrotic;
            debug!("Row {} disk {}: {} of {} pixels necrotic ({:.3})",
                   row_index, disk_index, disk.necrotic_coordinates.len(),
                   disk.blob.pixel_count(), disk.necrotic_portion);
            disk_count += 1;
        }
    }
    info!("Labeled necrosis in {} disks in {:?}", disk_count, label_start.elapsed());
    rows
}

/// A pixel is necrotic if its red channel exceeds its green channel, unless
/// vein suppression removes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelThresholdLabeler {
    pub vein_suppression: VeinSuppression,
}

impl NecrosisLabeler for ChannelThresholdLabeler {
    fn label(&self, disk: &Disk, field: &PixelField) -> Vec<Coord> {
        let bounds = disk.blob.bounds;
        let width = bounds.width() as usize;
        let height = bounds.height() as usize;
        let local_index = |coord: &Coord| {
            (coord.y - bounds.top()) as usize * width +
                (coord.x - bounds.left()) as usize
        };
        let mut mask = vec![false; width * height];
        for coord in &disk.blob.pixel_coordinates {
            if let Some(pixel) = field.get(*coord) {
                if pixel.r > pixel.g {
                    mask[local_index(coord)] = true;
                }
            }
        }
        let removed = suppress_veins(&mut mask, width, height, &self.vein_suppression);
        debug!("Vein suppression removed {} pixels from disk at {:?}",
               removed, bounds);
        disk.blob.pixel_coordinates.iter()
            .filter(|coord| mask[local_index(coord)])
            .copied()
            .collect()
    }
}

/// Removes set cells of `mask` (a `width` x `height` grid in raster order)
/// that have too few set cells around them. Each pass evaluates every set
/// cell against the mask as it was at the start of the pass, counting set
/// cells in the square neighborhood of the given radius; cells outside the
/// grid count as unset. Removing cells can expose more, so passes repeat up
/// to the configured count, stopping early once a pass removes nothing.
///
/// Returns the number of cells removed.
pub fn suppress_veins(mask: &mut [bool], width: usize, height: usize,
                      params: &VeinSuppression) -> usize {
    debug_assert_eq!(mask.len(), width * height);
    let radius = params.radius as usize;
    let box_side = 2 * radius + 1;
    let min_count = params.min_fraction * (box_side * box_side) as f64;
    let mut total_removed = 0;
    // Summed-area table with a zero border row and column.
    let mut sums = vec![0_u32; (width + 1) * (height + 1)];
    for pass in 0..params.passes {
        for y in 0..height {
            let mut row_sum = 0;
            for x in 0..width {
                row_sum += mask[y * width + x] as u32;
                sums[(y + 1) * (width + 1) + x + 1] =
                    sums[y * (width + 1) + x + 1] + row_sum;
            }
        }
        let mut removed = Vec::<usize>::new();
        for y in 0..height {
            let y0 = y.saturating_sub(radius);
            let y1 = std::cmp::min(y + radius + 1, height);
            for x in 0..width {
                if !mask[y * width + x] {
                    continue;
                }
                let x0 = x.saturating_sub(radius);
                let x1 = std::cmp::min(x + radius + 1, width);
                let count = sums[y1 * (width + 1) + x1] + sums[y0 * (width + 1) + x0]
                    - sums[y0 * (width + 1) + x1] - sums[y1 * (width + 1) + x0];
                if (count as f64) < min_count {
                    removed.push(y * width + x);
                }
            }
        }
        if removed.is_empty() {
            break;
        }
        debug!("Vein suppression pass {} removed {} pixels", pass, removed.len());
        total_removed += removed.len();
        for index in removed {
            mask[index] = false;
        }
    }
    total_removed
}

/// Sorted brightness values of a disk and where the light plateau starts,
/// for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessProfile {
    /// Sum of RGB channels per pixel, ascending.
    pub sorted_brightness: Vec<u32>,

    /// Index into `sorted_brightness` of the first necrotic pixel; None if
    /// no transition could be located.
    pub transition_index: Option<usize>,
}

/// Sorts the disk's pixels by brightness (r + g + b) and labels everything
/// from the dark-to-light transition onward as necrotic. See the
/// `histogram_funcs` module for the transition search and its caveats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessTransitionLabeler {
    pub smoothing: TransitionSmoothing,
}

impl BrightnessTransitionLabeler {
    // Disk pixels paired with brightness, sorted ascending. Ties keep the
    // disk's coordinate order.
    fn sorted_pixels(disk: &Disk, field: &PixelField) -> Vec<(u32, Coord)> {
        let mut pixels: Vec<(u32, Coord)> = disk.blob.pixel_coordinates.iter()
            .filter_map(|coord| field.get(*coord).map(|p| (p.brightness(), *coord)))
            .collect();
        pixels.sort_by_key(|(brightness, _)| *brightness);
        pixels
    }

    fn transition(&self, sorted: &[(u32, Coord)]) -> Option<usize> {
        let values: Vec<f64> = sorted.iter().map(|(b, _)| *b as f64).collect();
        find_transition_index(&values, &self.smoothing)
    }

    pub fn profile(&self, disk: &Disk, field: &PixelField) -> BrightnessProfile {
        let sorted = Self::sorted_pixels(disk, field);
        let transition_index = self.transition(&sorted);
        BrightnessProfile{
            sorted_brightness: sorted.into_iter().map(|(b, _)| b).collect(),
            transition_index}
    }
}

impl NecrosisLabeler for BrightnessTransitionLabeler {
    fn label(&self, disk: &Disk, field: &PixelField) -> Vec<Coord> {
        let sorted = Self::sorted_pixels(disk, field);
        match self.transition(&sorted) {
            Some(index) => {
                debug!("Brightness transition at {} of {} (brightness {:?})",
                       index, sorted.len(), sorted.get(index).map(|(b, _)| *b));
                sorted[index..].iter().map(|(_, coord)| *coord).collect()
            },
            None => {
                debug!("No brightness transition for disk at {:?}", disk.blob.bounds);
                Vec::new()
            },
        }
    }
}

// mod tests.
