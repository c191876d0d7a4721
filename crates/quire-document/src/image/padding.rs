// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// White padding to an exact page size, alternating sides for duplex output.

use image::{Rgba, RgbaImage};
use tracing::debug;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Which edge the page content is anchored to when padding horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalSide {
    Left,
    Right,
}

impl HorizontalSide {
    /// Side for `page_number` (1-based). Pages an even distance from
    /// `first_odd_page` are rectos and anchor left; the others anchor right.
    pub fn for_page(page_number: usize, first_odd_page: usize) -> Self {
        let offset = page_number as i64 - first_odd_page as i64;
        if offset.rem_euclid(2) == 0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Pad `image` with white to at least `target_width` x `target_height`.
///
/// Never crops: each output dimension is the larger of the image and the
/// target. Content is anchored to the top. Horizontally it sits on `side`
/// when width padding is needed and is centered otherwise.
pub fn pad_to_size(
    image: &RgbaImage,
    target_width: u32,
    target_height: u32,
    side: HorizontalSide,
) -> RgbaImage {
    let needs_width = image.width() < target_width;
    let needs_height = image.height() < target_height;
    if !needs_width && !needs_height {
        return image.clone();
    }

    let final_width = image.width().max(target_width);
    let final_height = image.height().max(target_height);
    let x = if needs_width {
        match side {
            HorizontalSide::Left => 0,
            HorizontalSide::Right => final_width - image.width(),
        }
    } else {
        (final_width - image.width()) / 2
    };

    debug!(
        from_w = image.width(),
        from_h = image.height(),
        final_width,
        final_height,
        ?side,
        "Padding page"
    );

    let mut padded = RgbaImage::from_pixel(final_width, final_height, WHITE);
    image::imageops::replace(&mut padded, image, i64::from(x), 0);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba<u8> = Rgba([10, 20, 30, 255]);

    #[test]
    fn rectos_and_versos_alternate_from_first_odd_page() {
        assert_eq!(HorizontalSide::for_page(1, 1), HorizontalSide::Left);
        assert_eq!(HorizontalSide::for_page(2, 1), HorizontalSide::Right);
        assert_eq!(HorizontalSide::for_page(3, 2), HorizontalSide::Right);
        assert_eq!(HorizontalSide::for_page(4, 2), HorizontalSide::Left);
        // Pages before the first odd page still alternate.
        assert_eq!(HorizontalSide::for_page(1, 3), HorizontalSide::Left);
    }

    #[test]
    fn left_pages_keep_content_at_origin() {
        let page = RgbaImage::from_pixel(10, 8, INK);
        let padded = pad_to_size(&page, 16, 12, HorizontalSide::Left);
        assert_eq!(padded.dimensions(), (16, 12));
        assert_eq!(*padded.get_pixel(0, 0), INK);
        assert_eq!(*padded.get_pixel(15, 0), WHITE);
        assert_eq!(*padded.get_pixel(0, 11), WHITE);
    }

    #[test]
    fn right_pages_anchor_to_right_edge() {
        let page = RgbaImage::from_pixel(10, 8, INK);
        let padded = pad_to_size(&page, 16, 8, HorizontalSide::Right);
        assert_eq!(*padded.get_pixel(6, 0), INK);
        assert_eq!(*padded.get_pixel(5, 0), WHITE);
    }

    #[test]
    fn never_crops_oversized_pages() {
        let page = RgbaImage::from_pixel(20, 8, INK);
        let padded = pad_to_size(&page, 16, 12, HorizontalSide::Right);
        assert_eq!(padded.dimensions(), (20, 12));
        assert_eq!(*padded.get_pixel(0, 0), INK);
    }

    #[test]
    fn exact_size_is_returned_unchanged() {
        let page = RgbaImage::from_pixel(16, 12, INK);
        assert_eq!(pad_to_size(&page, 16, 12, HorizontalSide::Left), page);
    }
}
