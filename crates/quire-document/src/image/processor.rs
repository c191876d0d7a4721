// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, fit, and encode page images. Operates on
// in-memory RGBA buffers using the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder as _, RgbaImage};
use quire_core::ImageFormat;
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument};

use crate::traits::{EncodedImage, ImageEncoder};

/// Processing steps for a single in-memory page image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// so steps chain:
///
/// ```ignore
/// let bytes = ImageProcessor::from_bytes(&png)?
///     .fit_within(1100, 850)
///     .encode(ImageFormat::Jpeg, 90)?;
/// ```
pub struct ImageProcessor {
    image: RgbaImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an encoded image (PNG, JPEG, WebP).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| QuireError::Image(format!("failed to decode image: {err}")))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    /// Wrap an already-decoded RGBA buffer.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Unpack interleaved 8-bit samples as a rasterizer hands them over.
    ///
    /// Rows start `stride` bytes apart and may carry padding past
    /// `width * channels`. The first three channels are RGB; a fourth is
    /// alpha, and anything beyond is ignored. Fails when there are fewer
    /// than three channels or the buffer is too short.
    pub fn from_samples(
        samples: &[u8],
        width: u32,
        height: u32,
        channels: usize,
        stride: usize,
    ) -> Result<Self> {
        let row_len = width as usize * channels;
        if channels < 3 || stride < row_len {
            return Err(QuireError::Image(format!(
                "unsupported sample layout: {channels} channels, stride {stride} for width {width}"
            )));
        }
        let needed = match height as usize {
            0 => 0,
            rows => (rows - 1) * stride + row_len,
        };
        if samples.len() < needed {
            return Err(QuireError::Image(format!(
                "sample buffer holds {} bytes, {needed} needed",
                samples.len()
            )));
        }

        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for row in (0..height as usize).map(|y| &samples[y * stride..y * stride + row_len]) {
            for px in row.chunks_exact(channels) {
                let alpha = if channels >= 4 { px[3] } else { 255 };
                rgba.extend_from_slice(&[px[0], px[1], px[2], alpha]);
            }
        }
        RgbaImage::from_raw(width, height, rgba)
            .map(Self::from_rgba)
            .ok_or_else(|| QuireError::Image("sample buffer size mismatch".into()))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Scale to the largest size that fits `max_width` x `max_height` while
    /// preserving aspect ratio. Uses Lanczos3; may upscale.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        let (width, height) = fitted_size(self.width(), self.height(), max_width, max_height);
        if (width, height) == (self.width(), self.height()) {
            return self;
        }
        debug!(
            from_w = self.width(),
            from_h = self.height(),
            width,
            height,
            "Resizing image"
        );
        let resized = image::imageops::resize(&self.image, width, height, FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Lossless PNG bytes, used as the cache payload format.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|err| QuireError::Encode(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode in `format`. `quality` (1-100) applies to JPEG only; WebP is
    /// written losslessly.
    pub fn encode(&self, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
        match format {
            ImageFormat::Png => self.to_png_bytes(),
            ImageFormat::Jpeg => {
                let mut buffer = Vec::new();
                let rgb = DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
                rgb.write_with_encoder(encoder)
                    .map_err(|err| QuireError::Encode(format!("JPEG encoding failed: {err}")))?;
                Ok(buffer)
            }
            ImageFormat::Webp => {
                let mut buffer = Vec::new();
                WebPEncoder::new_lossless(&mut buffer)
                    .write_image(
                        self.image.as_raw(),
                        self.width(),
                        self.height(),
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(|err| QuireError::Encode(format!("WebP encoding failed: {err}")))?;
                Ok(buffer)
            }
        }
    }
}

/// Largest (width, height) with the source aspect ratio inside the box.
pub fn fitted_size(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_width.max(1), max_height.max(1));
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let w = (width as f64 * scale).round().clamp(1.0, max_width.max(1) as f64);
    let h = (height as f64 * scale).round().clamp(1.0, max_height.max(1) as f64);
    (w as u32, h as u32)
}

/// `ImageEncoder` backed by the `image` crate codecs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardEncoder;

impl ImageEncoder for StandardEncoder {
    fn encode(&self, image: &RgbaImage, format: ImageFormat, quality: u8) -> Result<EncodedImage> {
        let processor = ImageProcessor::from_rgba(image.clone());
        let bytes = processor.encode(format, quality)?;
        Ok(EncodedImage {
            bytes,
            format,
            width: image.width(),
            height: image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn sample(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255])
        })
    }

    #[test]
    fn png_payload_decodes_to_identical_pixels() {
        let original = sample(31, 17);
        let bytes = ImageProcessor::from_rgba(original.clone())
            .to_png_bytes()
            .unwrap();
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap().into_rgba();
        assert_eq!(decoded, original);
    }

    #[test]
    fn encoders_emit_their_magic_bytes() {
        let processor = ImageProcessor::from_rgba(sample(16, 16));
        let jpeg = processor.encode(ImageFormat::Jpeg, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let png = processor.encode(ImageFormat::Png, 80).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let webp = processor.encode(ImageFormat::Webp, 80).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let fitted = ImageProcessor::from_rgba(sample(200, 100)).fit_within(550, 850);
        assert_eq!((fitted.width(), fitted.height()), (550, 275));
    }

    #[test]
    fn fitted_size_handles_tall_sources() {
        assert_eq!(fitted_size(850, 1100, 550, 850), (550, 712));
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"not an image"),
            Err(QuireError::Image(_))
        ));
    }

    #[test]
    fn samples_skip_row_padding() {
        // 2x2 RGB with each row padded to 8 bytes.
        let samples = [
            10, 11, 12, 20, 21, 22, 0xEE, 0xEE, //
            30, 31, 32, 40, 41, 42, 0xEE, 0xEE,
        ];
        let image = ImageProcessor::from_samples(&samples, 2, 2, 3, 8)
            .unwrap()
            .into_rgba();
        assert_eq!(image.get_pixel(1, 0).0, [20, 21, 22, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [30, 31, 32, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [40, 41, 42, 255]);
    }

    #[test]
    fn samples_keep_alpha_channel() {
        let samples = [1, 2, 3, 128, 4, 5, 6, 0];
        let image = ImageProcessor::from_samples(&samples, 2, 1, 4, 8)
            .unwrap()
            .into_rgba();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 128]);
        assert_eq!(image.get_pixel(1, 0).0, [4, 5, 6, 0]);
    }

    #[test]
    fn short_or_grey_samples_are_rejected() {
        assert!(ImageProcessor::from_samples(&[0; 10], 2, 2, 3, 6).is_err());
        assert!(ImageProcessor::from_samples(&[0; 8], 2, 2, 2, 4).is_err());
        assert!(ImageProcessor::from_samples(&[0; 12], 2, 2, 3, 4).is_err());
    }

    #[test]
    fn standard_encoder_reports_dimensions() {
        let encoded = StandardEncoder
            .encode(&sample(12, 9), ImageFormat::Png, 100)
            .unwrap();
        assert_eq!((encoded.width, encoded.height), (12, 9));
        assert_eq!(encoded.format, ImageFormat::Png);
    }
}
