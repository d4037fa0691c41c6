// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use image::{DynamicImage, RgbImage};
use log::{debug, info};

use crate::error::AssayError;

/// Pixel position in image coordinates; (0, 0) is the upper left pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Coord {
        Coord{x, y}
    }
}

/// One sample of the field. The color channels never change after decode;
/// the flags are filled in by the pipeline stages.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub is_dark: bool,
    pub is_necrotic: bool,
}

impl Pixel {
    pub fn rgb(r: u8, g: u8, b: u8) -> Pixel {
        Pixel{r, g, b, ..Default::default()}
    }

    /// Sum of the three channels, 0..=765.
    pub fn brightness(&self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }
}

/// Decoded image plus per-pixel flags, owned by a single analysis run.
#[derive(Clone, Debug)]
pub struct PixelField {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,

    // Threshold used when the dark flags were derived; None until then.
    dark_threshold: Option<u8>,
}

impl PixelField {
    /// Builds a field from an RGB image.
    pub fn from_rgb_image(image: &RgbImage) -> Result<PixelField, AssayError> {
        let (width, height) = image.dimensions();
        PixelField::from_raw(width, height, image.as_raw())
    }

    /// Builds a field from any decoded image. Alpha is ignored.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<PixelField, AssayError> {
        PixelField::from_rgb_image(&image.to_rgb8())
    }

    /// Builds a field from interleaved 8-bit RGB samples in raster order.
    pub fn from_raw(width: u32, height: u32, samples: &[u8])
                    -> Result<PixelField, AssayError> {
        if width == 0 || height == 0 {
            return Err(AssayError::EmptyImage{width, height});
        }
        let num_pixels = width as usize * height as usize;
        if samples.len() != num_pixels * 3 {
            return Err(AssayError::NonRectangular{width, height,
                                                  len: samples.len()});
        }
        let pixels = samples.chunks_exact(3)
            .map(|rgb| Pixel::rgb(rgb[0], rgb[1], rgb[2]))
            .collect();
        Ok(PixelField{width, height, pixels, dark_threshold: None})
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 &&
            (coord.x as u32) < self.width && (coord.y as u32) < self.height
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Returns None outside the image.
    pub fn get(&self, coord: Coord) -> Option<&Pixel> {
        self.index(coord).map(|i| &self.pixels[i])
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Pixel> {
        self.index(coord).map(move |i| &mut self.pixels[i])
    }

    pub fn is_dark(&self, coord: Coord) -> bool {
        self.get(coord).map_or(false, |p| p.is_dark)
    }

    pub fn is_necrotic(&self, coord: Coord) -> bool {
        self.get(coord).map_or(false, |p| p.is_necrotic)
    }

    /// Pixels in raster order.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Derives the dark flag of every pixel: dark iff all channels are below
    /// `threshold`. The flags are derived once per field; later calls leave
    /// them untouched and return the existing count.
    pub fn label_dark_pixels(&mut self, threshold: u8) -> usize {
        if let Some(previous) = self.dark_threshold {
            debug!("Dark pixels already labeled with threshold {}; ignoring {}",
                   previous, threshold);
            return self.pixels.iter().filter(|p| p.is_dark).count();
        }
        let dark_start = Instant::now();
        let mut dark_count = 0;
        for pixel in &mut self.pixels {
            pixel.is_dark =
                pixel.r < threshold && pixel.g < threshold && pixel.b < threshold;
            if pixel.is_dark {
                dark_count += 1;
            }
        }
        self.dark_threshold = Some(threshold);
        info!("Labeled {} of {} pixels dark in {:?}",
              dark_count, self.pixels.len(), dark_start.elapsed());
        dark_count
    }

    pub fn dark_threshold(&self) -> Option<u8> {
        self.dark_threshold
    }

    /// Clears every necrotic flag, e.g. before relabeling with another
    /// method.
    pub fn clear_necrotic(&mut self) {
        for pixel in &mut self.pixels {
            pixel.is_necrotic = false;
        }
    }
}

// mod tests.
