// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use image::{Rgb, RgbImage};
use imageproc::drawing;

use crate::blob_funcs::{rect_from_edges, Blob};
use crate::pixel_field::PixelField;
use crate::row_funcs::Row;

pub const NECROTIC_COLOR: Rgb<u8> = Rgb([255, 100, 0]);
pub const HEALTHY_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const DISK_BORDER_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const OTHER_BORDER_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const INNER_CIRCLE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Copies the field into an image, painting necrotic pixels orange and other
/// dark pixels green. Lighter pixels keep their color.
pub fn labeled_pixels_image(field: &PixelField) -> RgbImage {
    let (width, height) = field.dimensions();
    let mut image = RgbImage::new(width, height);
    for (pixel, out) in field.pixels().iter().zip(image.pixels_mut()) {
        *out = if pixel.is_necrotic {
            NECROTIC_COLOR
        } else if pixel.is_dark {
            HEALTHY_COLOR
        } else {
            Rgb([pixel.r, pixel.g, pixel.b])
        };
    }
    image
}

/// Draws a two pixel wide frame just outside `blob`'s bounding box. Parts
/// falling off the image are clipped.
pub fn draw_blob_border(image: &mut RgbImage, blob: &Blob, color: Rgb<u8>) {
    for margin in 1..=2 {
        let rect = rect_from_edges(blob.left() - margin, blob.top() - margin,
                                   blob.right() + margin, blob.bottom() + margin);
        drawing::draw_hollow_rect_mut(image, rect, color);
    }
}

/// The labeled pixels plus blob frames (green for leaf disks, black for
/// other blobs) and each disk's refined necrotic inner circle.
pub fn render_labeled_image(field: &PixelField, rows: &[Row], other_blobs: &[Blob])
                            -> RgbImage {
    let mut image = labeled_pixels_image(field);
    for blob in other_blobs {
        draw_blob_border(&mut image, blob, OTHER_BORDER_COLOR);
    }
    for disk in rows.iter().flat_map(|row| &row.disks) {
        draw_blob_border(&mut image, &disk.blob, DISK_BORDER_COLOR);
        if let Some(radius) = disk.necrotic_inner_radius {
            if radius > 0 {
                let (cx, cy) = disk.blob.center();
                drawing::draw_hollow_circle_mut(
                    &mut image, (cx.round() as i32, cy.round() as i32),
                    radius as i32, INNER_CIRCLE_COLOR);
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use crate::blob_funcs::find_dark_blobs;
    use crate::disk_funcs::{classify_blobs, Disk};
    use crate::config::DiskCriteria;
    use crate::disk_funcs::tests::paint_disk;
    use crate::pixel_field::Coord;
    use super::*;

    #[test]
    fn test_labeled_pixel_colors() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([240, 230, 220]));
        image.put_pixel(3, 3, Rgb([40, 110, 40]));
        image.put_pixel(4, 3, Rgb([130, 90, 50]));
        let mut field = PixelField::from_rgb_image(&image).unwrap();
        field.label_dark_pixels(150);
        field.get_mut(Coord::new(4, 3)).unwrap().is_necrotic = true;
        let labeled = labeled_pixels_image(&field);
        assert_eq!(*labeled.get_pixel(3, 3), HEALTHY_COLOR);
        assert_eq!(*labeled.get_pixel(4, 3), NECROTIC_COLOR);
        assert_eq!(*labeled.get_pixel(0, 0), Rgb([240, 230, 220]));
    }

    #[test]
    fn test_render_frames_and_circle() {
        let mut image = RgbImage::from_pixel(120, 80, Rgb([250, 250, 250]));
        paint_disk(&mut image, 40, 40, 25, Rgb([40, 110, 40]));
        // A pen mark touching the image edge.
        for x in 100..120 {
            image.put_pixel(x, 0, Rgb([0, 0, 0]));
        }
        let mut field = PixelField::from_rgb_image(&image).unwrap();
        let blobs = find_dark_blobs(&mut field, 150);
        let (mut disks, others) = classify_blobs(blobs, &DiskCriteria::default());
        assert_eq!(disks.len(), 1);
        assert_eq!(others.len(), 1);
        disks[0].necrotic_inner_radius = Some(10);
        let rows = vec![Row{disks}];
        let rendered = render_labeled_image(&field, &rows, &others);

        // Disk spans 15..=65; frame at 14 and 13.
        assert_eq!(*rendered.get_pixel(14, 40), DISK_BORDER_COLOR);
        assert_eq!(*rendered.get_pixel(13, 40), DISK_BORDER_COLOR);
        assert_eq!(*rendered.get_pixel(12, 40), Rgb([250, 250, 250]));
        assert_eq!(*rendered.get_pixel(66, 40), DISK_BORDER_COLOR);
        assert_eq!(*rendered.get_pixel(40, 67), DISK_BORDER_COLOR);
        // Inner circle.
        assert_eq!(*rendered.get_pixel(50, 40), INNER_CIRCLE_COLOR);
        // Healthy disk interior.
        assert_eq!(*rendered.get_pixel(40, 40), HEALTHY_COLOR);
        // The pen mark's frame below it survives clipping.
        assert_eq!(*rendered.get_pixel(105, 1), OTHER_BORDER_COLOR);
        assert_eq!(*rendered.get_pixel(105, 2), OTHER_BORDER_COLOR);
    }

    #[test]
    fn test_render_without_circle() {
        let image = RgbImage::from_pixel(60, 60, Rgb([250, 250, 250]));
        let field = PixelField::from_rgb_image(&image).unwrap();
        let mut disk_image = image.clone();
        paint_disk(&mut disk_image, 30, 30, 20, Rgb([40, 110, 40]));
        let mut disk_field = PixelField::from_rgb_image(&disk_image).unwrap();
        let blobs = find_dark_blobs(&mut disk_field, 150);
        let disk = Disk::new(blobs.into_iter().next().unwrap());
        // Frames but no circle when the radius has not been refined.
        let rendered = render_labeled_image(&field, &[Row{disks: vec![disk]}], &[]);
        assert_eq!(*rendered.get_pixel(30, 30), Rgb([250, 250, 250]));
        assert_eq!(*rendered.get_pixel(9, 30), DISK_BORDER_COLOR);
    }
}  // mod tests.
