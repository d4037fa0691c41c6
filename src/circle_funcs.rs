// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::BTreeSet;
use std::time::Instant;

use log::{debug, info};

use crate::config::CircleSearch;
use crate::disk_funcs::Disk;
use crate::pixel_field::{Coord, PixelField};
use crate::row_funcs::Row;

/// The distinct pixels hit by `samples` equally spaced points on the circle
/// of `radius` around `center`.
pub fn circle_pixels(center: (f64, f64), radius: f64, samples: usize) -> BTreeSet<Coord> {
    let mut pixels = BTreeSet::<Coord>::new();
    for i in 0..samples {
        let angle = 2.0 * std::f64::consts::PI * i as f64 / samples as f64;
        pixels.insert(Coord::new((center.0 + radius * angle.cos()).round() as i32,
                                 (center.1 + radius * angle.sin()).round() as i32));
    }
    pixels
}

/// Of the circle's pixels that are dark, the fraction that are also
/// necrotic. None if the circle touches no dark pixel.
pub fn necrotic_fraction_on_circle(field: &PixelField, center: (f64, f64),
                                   radius: f64, samples: usize) -> Option<f64> {
    let mut dark_on_circle = 0;
    let mut necrotic_on_circle = 0;
    for coord in circle_pixels(center, radius, samples) {
        if let Some(pixel) = field.get(coord) {
            if pixel.is_dark {
                dark_on_circle += 1;
                if pixel.is_necrotic {
                    necrotic_on_circle += 1;
                }
            }
        }
    }
    if dark_on_circle == 0 {
        return None;
    }
    Some(necrotic_on_circle as f64 / dark_on_circle as f64)
}

/// Starting from the disk's estimated radius, shrinks a circle centered on
/// the disk until no more than `search.majority` of its dark boundary is
/// necrotic. The result is where the necrotic ring gives way to healthy
/// core. A probe circle touching no dark pixel ends the search.
pub fn find_necrotic_inner_radius(disk: &Disk, field: &PixelField,
                                  search: &CircleSearch) -> u32 {
    let center = disk.blob.center();
    let mut radius = disk.estimated_radius().round() as u32;
    while radius > 0 {
        match necrotic_fraction_on_circle(field, center, radius as f64, search.samples) {
            Some(fraction) if fraction > search.majority => radius -= 1,
            _ => break,
        }
    }
    radius
}

/// Sets `necrotic_inner_radius` on every disk of `rows`. The field's
/// necrotic flags must already be labeled.
pub fn refine_necrotic_radii(mut rows: Vec<Row>, field: &PixelField,
                             search: &CircleSearch) -> Vec<Row> {
    let refine_start = Instant::now();
    for row in &mut rows {
        for disk in &mut row.disks {
            let radius = find_necrotic_inner_radius(disk, field, search);
            debug!("Disk at {:?}: estimated radius {:.1}, necrotic inner radius {}",
                   disk.blob.bounds, disk.estimated_radius(), radius);
            disk.necrotic_inner_radius = Some(radius);
        }
    }
    info!("Refined necrotic circles in {:?}", refine_start.elapsed());
    rows
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use crate::blob_funcs::find_dark_blobs;
    use crate::config::DiskCriteria;
    use crate::disk_funcs::classify_blobs;
    use crate::disk_funcs::tests::paint_disk;
    use super::*;

    // A 200x200 field holding one dark disk of radius 50, with every pixel
    // farther than `necrotic_radius` from the center flagged necrotic. A
    // negative `necrotic_radius` flags the whole disk.
    fn ring_field(necrotic_radius: i32) -> (PixelField, Disk) {
        let mut image = RgbImage::from_pixel(200, 200, Rgb([250, 250, 250]));
        paint_disk(&mut image, 100, 100, 50, Rgb([40, 110, 40]));
        let mut field = PixelField::from_rgb_image(&image).unwrap();
        let blobs = find_dark_blobs(&mut field, 150);
        let (mut disks, _) = classify_blobs(blobs, &DiskCriteria::default());
        assert_eq!(disks.len(), 1);
        let disk = disks.remove(0);
        for coord in &disk.blob.pixel_coordinates {
            let (dx, dy) = (coord.x - 100, coord.y - 100);
            if necrotic_radius < 0 ||
                dx * dx + dy * dy > necrotic_radius * necrotic_radius
            {
                field.get_mut(*coord).unwrap().is_necrotic = true;
            }
        }
        (field, disk)
    }

    #[test]
    fn test_circle_pixels_deduplicated() {
        // A radius 2 circle has few distinct pixels, however many samples.
        let pixels = circle_pixels((10.0, 10.0), 2.0, 1000);
        assert!(pixels.len() < 20);
        assert!(pixels.contains(&Coord::new(12, 10)));
        assert!(pixels.contains(&Coord::new(10, 8)));
        assert!(circle_pixels((10.0, 10.0), 0.0, 1000).len() == 1);
    }

    #[test]
    fn test_inner_radius_of_ring() {
        let (field, disk) = ring_field(35);
        let radius = find_necrotic_inner_radius(&disk, &field, &CircleSearch::default());
        assert!((radius as i32 - 35).abs() <= 2, "radius {}", radius);
    }

    #[test]
    fn test_no_necrosis_keeps_estimated_radius() {
        let (field, disk) = ring_field(60);
        let radius = find_necrotic_inner_radius(&disk, &field, &CircleSearch::default());
        assert_eq!(radius, 50);
    }

    #[test]
    fn test_fully_necrotic_shrinks_to_zero() {
        let (field, disk) = ring_field(-1);
        let radius = find_necrotic_inner_radius(&disk, &field, &CircleSearch::default());
        assert_eq!(radius, 0);
    }

    #[test]
    fn test_no_dark_pixels_on_circle() {
        let image = RgbImage::from_pixel(50, 50, Rgb([250, 250, 250]));
        let field = PixelField::from_rgb_image(&image).unwrap();
        assert_eq!(necrotic_fraction_on_circle(&field, (25.0, 25.0), 10.0, 1000), None);
        // Circle partly off the image.
        assert_eq!(necrotic_fraction_on_circle(&field, (0.0, 0.0), 10.0, 1000), None);
    }

    #[test]
    fn test_refine_sets_every_disk() {
        let (field, disk) = ring_field(35);
        let rows = vec![Row{disks: vec![disk.clone()]}, Row{disks: vec![disk]}];
        let rows = refine_necrotic_radii(rows, &field, &CircleSearch::default());
        for row in &rows {
            assert!(row.disks[0].necrotic_inner_radius.is_some());
        }
    }
}  // mod tests.
