use crate::foundation::error::{ScrubError, ScrubResult};

pub use kurbo::{Affine, Rect, Size};

/// 0-based index into a loaded frame sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub usize);

impl FrameIndex {
    /// Resolve a continuous scrub value into a frame index.
    ///
    /// The value is rounded to the nearest integer and clamped into `[0, frame_count - 1]`.
    /// Non-finite values map to frame 0. Returns `None` for an empty sequence.
    pub fn from_scrub(value: f64, frame_count: usize) -> Option<Self> {
        if frame_count == 0 {
            return None;
        }
        let max = (frame_count - 1) as f64;
        let v = if value.is_finite() { value } else { 0.0 };
        Some(Self(v.round().clamp(0.0, max) as usize))
    }
}

/// Host viewport description: CSS size plus device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Viewport width in CSS pixels.
    pub css_width: f64,
    /// Viewport height in CSS pixels.
    pub css_height: f64,
    /// Device pixel ratio reported by the host (physical px per CSS px).
    pub dpr: f64,
}

impl Viewport {
    /// Create a validated viewport.
    pub fn new(css_width: f64, css_height: f64, dpr: f64) -> ScrubResult<Self> {
        let vp = Self {
            css_width,
            css_height,
            dpr,
        };
        vp.validate()?;
        Ok(vp)
    }

    /// Check that all dimensions are finite, sizes are non-negative and `dpr > 0`.
    pub fn validate(&self) -> ScrubResult<()> {
        if !self.css_width.is_finite() || !self.css_height.is_finite() {
            return Err(ScrubError::validation("viewport size must be finite"));
        }
        if self.css_width < 0.0 || self.css_height < 0.0 {
            return Err(ScrubError::validation("viewport size must be >= 0"));
        }
        if !self.dpr.is_finite() || self.dpr <= 0.0 {
            return Err(ScrubError::validation(
                "device pixel ratio must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Size in CSS pixels.
    pub fn css_size(&self) -> Size {
        Size::new(self.css_width, self.css_height)
    }

    /// Backing-store resolution: `css size * dpr`, rounded, at least 1x1.
    pub fn backing_size(&self) -> (u32, u32) {
        fn px(css: f64, dpr: f64) -> u32 {
            (css * dpr).round().clamp(1.0, f64::from(u32::MAX)) as u32
        }
        (px(self.css_width, self.dpr), px(self.css_height, self.dpr))
    }

    /// Transform that maps CSS-pixel draw coordinates onto the backing store.
    pub fn css_to_backing(&self) -> Affine {
        Affine::scale(self.dpr)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
