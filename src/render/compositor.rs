use crate::{
    foundation::{
        config::HeroConfig,
        core::{FrameIndex, Size},
        error::ScrubResult,
    },
    render::{
        cover::{DEFAULT_BIAS_X, cover_rect},
        surface::Surface,
    },
    sequence::loader::FrameSet,
};

/// Result of a single compositor invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The frame was drawn.
    Drawn(FrameIndex),
    /// Nothing was touched; the surface keeps its previous contents.
    Skipped(SkipReason),
}

/// Why a draw was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The frame set has no slots.
    EmptySet,
    /// The frame at this index failed to load.
    MissingFrame(FrameIndex),
    /// The surface has no drawable area yet.
    NoArea,
}

/// Draws the frame nearest a scrub value, cover-fitted, into a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Compositor {
    bias_x: f64,
    clear_rgba: [u8; 4],
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_BIAS_X, [0, 0, 0, 255])
    }
}

impl Compositor {
    /// Compositor with an explicit crop bias and clear colour.
    pub fn new(bias_x: f64, clear_rgba: [u8; 4]) -> Self {
        Self { bias_x, clear_rgba }
    }

    /// Compositor configured from hero settings.
    pub fn from_config(cfg: &HeroConfig) -> Self {
        Self::new(cfg.bias_x, cfg.clear_rgba)
    }

    /// Horizontal crop bias.
    pub fn bias_x(&self) -> f64 {
        self.bias_x
    }

    /// Draw the frame for `scrub_value` (rounded, clamped) into `surface`.
    ///
    /// Missing frames, empty sets and zero-area surfaces are no-ops: the surface is
    /// neither cleared nor drawn.
    pub fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        frames: &FrameSet,
        scrub_value: f64,
    ) -> ScrubResult<DrawOutcome> {
        let Some(index) = FrameIndex::from_scrub(scrub_value, frames.len()) else {
            return Ok(DrawOutcome::Skipped(SkipReason::EmptySet));
        };
        let Some(frame) = frames.get(index) else {
            tracing::trace!(index = index.0, "frame missing; draw skipped");
            return Ok(DrawOutcome::Skipped(SkipReason::MissingFrame(index)));
        };
        let image = Size::new(f64::from(frame.width), f64::from(frame.height));
        let Some(dst) = cover_rect(surface.css_size(), image, self.bias_x) else {
            return Ok(DrawOutcome::Skipped(SkipReason::NoArea));
        };

        surface.clear(self.clear_rgba);
        surface.draw_frame(index, frame, dst)?;
        Ok(DrawOutcome::Drawn(index))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
