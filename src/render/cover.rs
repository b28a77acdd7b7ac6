//! "Cover" placement: scale an image to fill a target, cropping the overflow.

use crate::foundation::core::{Rect, Size};

/// Default horizontal crop bias. Keeps the right side of wide frames in view on
/// narrow viewports.
pub const DEFAULT_BIAS_X: f64 = 0.75;

/// Destination rectangle (in canvas coordinates) that covers `canvas` with `image`.
///
/// - Canvas relatively wider than the image: fit width, crop top/bottom equally.
/// - Otherwise: fit height, crop left/right with the left edge at
///   `(canvas.width - drawn.width) * bias_x`.
///
/// Returns `None` when either size is empty or non-finite.
pub fn cover_rect(canvas: Size, image: Size, bias_x: f64) -> Option<Rect> {
    let valid = |s: Size| {
        s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0
    };
    if !valid(canvas) || !valid(image) {
        return None;
    }

    let canvas_ratio = canvas.width / canvas.height;
    let image_ratio = image.width / image.height;
    let bias_x = if bias_x.is_finite() {
        bias_x.clamp(0.0, 1.0)
    } else {
        DEFAULT_BIAS_X
    };

    let (x, y, w, h) = if canvas_ratio > image_ratio {
        let w = canvas.width;
        let h = canvas.width / image_ratio;
        (0.0, (canvas.height - h) / 2.0, w, h)
    } else {
        let h = canvas.height;
        let w = canvas.height * image_ratio;
        ((canvas.width - w) * bias_x, 0.0, w, h)
    };
    Some(Rect::new(x, y, x + w, y + h))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cover.rs"]
mod tests;
