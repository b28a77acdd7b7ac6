use crate::{
    animation::ease::Ease,
    foundation::error::{ScrubError, ScrubResult},
};

/// Fraction of the remaining distance covered after `lag_secs` is `1 - e^-SETTLE_TIME_CONSTANTS`.
const SETTLE_TIME_CONSTANTS: f64 = 3.0;
/// Distance (in frames) below which a smoothed value snaps onto its target.
const SNAP_EPSILON: f64 = 1e-3;

/// How the scrub value follows scroll progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scrub {
    /// Value jumps to the scroll-derived target on every scroll event.
    Instant,
    /// Value chases the target; after `lag_secs` it has covered ~95% of the gap.
    Smoothed {
        /// Catch-up time in seconds. `0` behaves like [`Scrub::Instant`].
        #[serde(rename = "lagSecs")]
        lag_secs: f64,
    },
}

impl Default for Scrub {
    fn default() -> Self {
        Self::Smoothed { lag_secs: 0.5 }
    }
}

impl Scrub {
    /// Reject negative or non-finite lag.
    pub fn validate(&self) -> ScrubResult<()> {
        match *self {
            Self::Instant => Ok(()),
            Self::Smoothed { lag_secs } => {
                if !lag_secs.is_finite() || lag_secs < 0.0 {
                    return Err(ScrubError::validation(
                        "scrub lagSecs must be finite and >= 0",
                    ));
                }
                Ok(())
            }
        }
    }

    fn lag_secs(self) -> Option<f64> {
        match self {
            Self::Smoothed { lag_secs } if lag_secs > 0.0 => Some(lag_secs),
            _ => None,
        }
    }
}

/// The document region that stays pinned while the sequence scrubs.
///
/// Scroll offsets are CSS pixels measured from the top of the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinnedRegion {
    /// Document offset where pinning starts.
    pub top: f64,
    /// Scroll distance that spans the full frame range.
    pub scroll_length: f64,
}

impl PinnedRegion {
    /// Region sized as `frame_count * scrub_distance` starting at `top`.
    pub fn for_frames(frame_count: usize, scrub_distance: f64, top: f64) -> Self {
        let region = Self {
            top,
            scroll_length: frame_count as f64 * scrub_distance,
        };
        tracing::debug!(
            frame_count,
            top,
            scroll_length = region.scroll_length,
            "pinned region"
        );
        region
    }

    /// Normalized progress through the region, clamped to `[0, 1]`.
    pub fn progress(&self, scroll_y: f64) -> f64 {
        if !scroll_y.is_finite() {
            return 0.0;
        }
        if self.scroll_length <= 0.0 {
            return if scroll_y >= self.top { 1.0 } else { 0.0 };
        }
        ((scroll_y - self.top) / self.scroll_length).clamp(0.0, 1.0)
    }

    /// Whether the container is held in place at this scroll offset.
    pub fn is_pinned(&self, scroll_y: f64) -> bool {
        scroll_y >= self.top && scroll_y < self.top + self.scroll_length
    }

    /// Document height reserved for the pin: the scroll length plus one viewport.
    pub fn spacer_height(&self, viewport_css_height: f64) -> f64 {
        self.scroll_length + viewport_css_height.max(0.0)
    }
}

/// Maps scroll progress to a continuous frame value in `[0, frame_count - 1]`.
///
/// Sole writer of the scrub value; readers receive copies.
#[derive(Clone, Debug)]
pub struct Scrubber {
    max: f64,
    ease: Ease,
    mode: Scrub,
    value: f64,
    target: f64,
}

impl Scrubber {
    /// Create a scrubber for `frame_count` frames, starting at frame 0.
    pub fn new(frame_count: usize, mode: Scrub, ease: Ease) -> Self {
        Self {
            max: frame_count.saturating_sub(1) as f64,
            ease,
            mode,
            value: 0.0,
            target: 0.0,
        }
    }

    /// Current (possibly mid-transition) scrub value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value the scrubber is heading toward.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Target value for a given progress, before smoothing.
    pub fn target_for(&self, progress: f64) -> f64 {
        let p = if progress.is_finite() { progress } else { 0.0 };
        (self.ease.apply(p) * self.max).clamp(0.0, self.max)
    }

    /// Feed new scroll progress.
    ///
    /// Returns the new value when it changed immediately ([`Scrub::Instant`]); smoothed
    /// scrubbers only move their target and report changes from [`Scrubber::tick`].
    pub fn set_progress(&mut self, progress: f64) -> Option<f64> {
        self.target = self.target_for(progress);
        if self.mode.lag_secs().is_some() {
            return None;
        }
        if self.value == self.target {
            return None;
        }
        self.value = self.target;
        Some(self.value)
    }

    /// Jump straight to the value for `progress`, bypassing smoothing.
    pub fn snap_to(&mut self, progress: f64) -> f64 {
        self.target = self.target_for(progress);
        self.value = self.target;
        self.value
    }

    /// Advance smoothing by `dt_secs`. Returns `None` when settled.
    pub fn tick(&mut self, dt_secs: f64) -> Option<f64> {
        if !self.is_settling() || !dt_secs.is_finite() || dt_secs <= 0.0 {
            return None;
        }
        let Some(lag) = self.mode.lag_secs() else {
            self.value = self.target;
            return Some(self.value);
        };

        let alpha = 1.0 - (-dt_secs * SETTLE_TIME_CONSTANTS / lag).exp();
        self.value += (self.target - self.value) * alpha;
        if (self.target - self.value).abs() < SNAP_EPSILON {
            self.value = self.target;
        }
        Some(self.value)
    }

    /// Whether the value still has distance to cover.
    pub fn is_settling(&self) -> bool {
        self.value != self.target
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/scrub.rs"]
mod tests;
