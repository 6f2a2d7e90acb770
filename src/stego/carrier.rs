//! Carrier images.
//!
//! Any format the `image` crate can decode is accepted as a cover. Internally
//! everything is RGBA8; output is always PNG since any lossy re-encoding would
//! destroy the LSB payload.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::warn;

use super::capacity::CapacityPlan;
use super::StegoError;

/// An RGBA8 pixel buffer used as cover or stego carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    image: RgbaImage,
}

impl Carrier {
    /// Loads a carrier from an image file. The format is sniffed from the
    /// content, not the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Decodes a carrier from encoded image bytes (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Wraps a decoded image, converting it to RGBA8.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image: image.into_rgba8(),
        }
    }

    /// Wraps an RGBA8 buffer as is.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.image.width() as usize * self.image.height() as usize
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.image
    }

    /// Mutable raw RGBA bytes, row-major.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// The underlying image.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consumes self and returns the underlying image.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Builds the stego canvas for `plan`: the cover scaled to the planned
    /// size if needed, composited over opaque black.
    ///
    /// The result is fully opaque. Identical input gives identical output.
    pub fn prepare(&self, plan: &CapacityPlan) -> Carrier {
        let mut image = if plan.resized {
            warn!(
                "Cover {}x{} too small, scaling to {}x{}",
                self.width(),
                self.height(),
                plan.width,
                plan.height
            );
            imageops::resize(&self.image, plan.width, plan.height, FilterType::Triangle)
        } else {
            self.image.clone()
        };

        for pixel in image.pixels_mut() {
            let alpha = u16::from(pixel[3]);
            for c in 0..3 {
                pixel[c] = ((u16::from(pixel[c]) * alpha + 127) / 255) as u8;
            }
            pixel[3] = 255;
        }

        Carrier { image }
    }

    /// Encodes the carrier as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| StegoError::ImageSaveError(e.to_string()))?;
        Ok(bytes)
    }

    /// Writes the carrier as PNG, whatever the path's extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StegoError> {
        let bytes = self.to_png_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    fn create_test_image(width: u32, height: u32, alpha: u8) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([
                ((x * 17) % 256) as u8,
                ((y * 23) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
                alpha,
            ])
        })
    }

    fn unchanged_plan(width: u32, height: u32) -> CapacityPlan {
        CapacityPlan {
            bpc: 1,
            width,
            height,
            resized: false,
            required_pixels: 729,
        }
    }

    #[test]
    fn test_prepare_keeps_opaque_cover() {
        let image = create_test_image(40, 30, 255);
        let carrier = Carrier::from_rgba(image.clone());

        let prepared = carrier.prepare(&unchanged_plan(40, 30));
        assert_eq!(prepared.image(), &image);
    }

    #[test]
    fn test_prepare_flattens_alpha_over_black() {
        let image = ImageBuffer::from_pixel(4, 4, Rgba([200, 100, 50, 128]));
        let prepared = Carrier::from_rgba(image).prepare(&unchanged_plan(4, 4));

        for pixel in prepared.image().pixels() {
            assert_eq!(pixel.0, [100, 50, 25, 255]);
        }

        let transparent = ImageBuffer::from_pixel(2, 2, Rgba([255, 255, 255, 0]));
        let prepared = Carrier::from_rgba(transparent).prepare(&unchanged_plan(2, 2));
        assert!(prepared.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_prepare_resizes() {
        let carrier = Carrier::from_rgba(create_test_image(20, 10, 255));
        let plan = CapacityPlan {
            bpc: 1,
            width: 60,
            height: 30,
            resized: true,
            required_pixels: 1500,
        };

        let prepared = carrier.prepare(&plan);
        assert_eq!((prepared.width(), prepared.height()), (60, 30));
        assert_eq!(prepared.pixel_count(), 1800);
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let carrier = Carrier::from_rgba(create_test_image(33, 17, 200));
        let plan = CapacityPlan {
            bpc: 2,
            width: 70,
            height: 36,
            resized: true,
            required_pixels: 2000,
        };
        assert_eq!(carrier.prepare(&plan), carrier.prepare(&plan));
    }

    #[test]
    fn test_png_roundtrip() {
        let carrier = Carrier::from_rgba(create_test_image(50, 40, 255));

        let png = carrier.to_png_bytes().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = Carrier::from_bytes(&png).unwrap();
        assert_eq!(decoded, carrier);
    }

    #[test]
    fn test_save_is_always_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jpg");

        let carrier = Carrier::from_rgba(create_test_image(8, 8, 255));
        carrier.save(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(Carrier::from_file(&path).unwrap(), carrier);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = Carrier::from_bytes(b"not an image");
        assert!(matches!(result, Err(StegoError::ImageLoadError(_))));
    }
}
