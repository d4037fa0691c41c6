// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::cmp;
use std::time::Instant;

use imageproc::rect::Rect;
use log::{debug, info};

use crate::pixel_field::{Coord, PixelField};

/// A connected region of dark pixels. Leaf disks, pen marks, and anything
/// else darker than the paper all show up as blobs.
#[derive(Clone, Debug)]
pub struct Blob {
    /// Tight bounding box of `pixel_coordinates`. Edges are inclusive.
    pub bounds: Rect,

    /// Member pixels, each appearing in exactly one blob. Unordered.
    pub pixel_coordinates: Vec<Coord>,

    /// Set by the disk classifier.
    pub is_leaf_disk: bool,
}

impl Blob {
    fn from_coordinates(pixel_coordinates: Vec<Coord>) -> Blob {
        debug_assert!(!pixel_coordinates.is_empty());
        let mut left = i32::MAX;
        let mut right = i32::MIN;
        let mut top = i32::MAX;
        let mut bottom = i32::MIN;
        for coord in &pixel_coordinates {
            left = cmp::min(left, coord.x);
            right = cmp::max(right, coord.x);
            top = cmp::min(top, coord.y);
            bottom = cmp::max(bottom, coord.y);
        }
        Blob{bounds: rect_from_edges(left, top, right, bottom),
             pixel_coordinates, is_leaf_disk: false}
    }

    pub fn top(&self) -> i32 {
        self.bounds.top()
    }

    pub fn bottom(&self) -> i32 {
        self.bounds.bottom()
    }

    pub fn left(&self) -> i32 {
        self.bounds.left()
    }

    pub fn right(&self) -> i32 {
        self.bounds.right()
    }

    /// Extent as `bottom - top`, i.e. one less than the pixel count spanned.
    pub fn height(&self) -> u32 {
        (self.bottom() - self.top()) as u32
    }

    /// Extent as `right - left`.
    pub fn width(&self) -> u32 {
        (self.right() - self.left()) as u32
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_coordinates.len()
    }

    /// Midpoint of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        ((self.left() + self.right()) as f64 / 2.0,
         (self.top() + self.bottom()) as f64 / 2.0)
    }

    // Whether `other` overlaps or is adjacent to this blob, comparing the
    // bounding boxes only.
    fn touches(&self, other: &Blob) -> bool {
        ranges_overlap(self.top() - 1, self.bottom() + 1,
                       other.top(), other.bottom()) &&
            ranges_overlap(self.left() - 1, self.right() + 1,
                           other.left(), other.right())
    }

    // Absorbs `other`'s pixels and bounding box.
    fn absorb(&mut self, mut other: Blob) {
        self.bounds = rect_from_edges(cmp::min(self.left(), other.left()),
                                      cmp::min(self.top(), other.top()),
                                      cmp::max(self.right(), other.right()),
                                      cmp::max(self.bottom(), other.bottom()));
        self.pixel_coordinates.append(&mut other.pixel_coordinates);
    }
}

/// Rect spanning the given inclusive edges.
pub fn rect_from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Rect {
    debug_assert!(left <= right && top <= bottom);
    Rect::at(left, top).of_size((right - left + 1) as u32,
                                (bottom - top + 1) as u32)
}

/// Whether the closed intervals [start1, end1] and [start2, end2] share at
/// least one value.
pub fn ranges_overlap(start1: i32, end1: i32, start2: i32, end2: i32) -> bool {
    start1 <= end2 && start2 <= end1
}

// Claims the 8-connected dark region containing `seed`, marking each pixel
// in `claimed`. Each pixel is pushed at most once, so the work is bounded by
// the region size.
fn flood_fill(field: &PixelField, claimed: &mut [bool], seed: Coord) -> Vec<Coord> {
    let width = field.width() as usize;
    let mut region = Vec::<Coord>::new();
    let mut stack = vec![seed];
    claimed[seed.y as usize * width + seed.x as usize] = true;
    while let Some(coord) = stack.pop() {
        region.push(coord);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbor = Coord::new(coord.x + dx, coord.y + dy);
                if !field.is_dark(neighbor) {
                    continue;  // Also covers out of bounds.
                }
                let index = neighbor.y as usize * width + neighbor.x as usize;
                if !claimed[index] {
                    claimed[index] = true;
                    stack.push(neighbor);
                }
            }
        }
    }
    region
}

/// Labels the dark pixels of `field` and gathers them into disjoint blobs.
///
/// The field is scanned in raster order; each dark pixel not yet in a blob
/// seeds an 8-connected flood fill. The resulting blobs are then merged
/// wherever their bounding boxes overlap or touch (see [consolidate_blobs()]).
/// Blobs are returned in order of discovery.
pub fn find_dark_blobs(field: &mut PixelField, dark_threshold: u8) -> Vec<Blob> {
    field.label_dark_pixels(dark_threshold);

    let blobs_start = Instant::now();
    let (width, height) = field.dimensions();
    let mut claimed = vec![false; width as usize * height as usize];
    let mut blobs = Vec::<Blob>::new();
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let coord = Coord::new(x, y);
            if !field.is_dark(coord) ||
                claimed[y as usize * width as usize + x as usize] {
                continue;
            }
            let region = flood_fill(field, &mut claimed, coord);
            debug!("Region of {} pixels seeded at {:?}", region.len(), coord);
            blobs.push(Blob::from_coordinates(region));
        }
    }
    let raw_count = blobs.len();
    let blobs = consolidate_blobs(blobs);
    info!("Found {} blobs ({} before merging) in {:?}",
          blobs.len(), raw_count, blobs_start.elapsed());
    blobs
}

/// Merges blobs whose bounding boxes overlap or are adjacent.
///
/// Each blob is tested against the already consolidated blobs in order and
/// merged into the first one it touches, otherwise it starts a new entry.
/// A merge can grow a box until it touches an entry it was not compared
/// against, so passes repeat until one makes no merges. The result is
/// therefore unchanged by another call.
pub fn consolidate_blobs(mut blobs: Vec<Blob>) -> Vec<Blob> {
    loop {
        let count_before = blobs.len();
        let mut consolidated = Vec::<Blob>::with_capacity(blobs.len());
        for blob in blobs {
            match consolidated.iter_mut().find(|existing| existing.touches(&blob)) {
                Some(existing) => existing.absorb(blob),
                None => consolidated.push(blob),
            }
        }
        blobs = consolidated;
        if blobs.len() == count_before {
            return blobs;
        }
        debug!("Merge pass reduced {} blobs to {}", count_before, blobs.len());
    }
}

// mod tests.
