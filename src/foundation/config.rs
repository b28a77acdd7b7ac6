use std::path::Path;

use anyhow::Context as _;

use crate::{
    animation::{ease::Ease, scrub::Scrub},
    foundation::error::{ScrubError, ScrubResult},
};

/// Tunables for the scroll-scrubbed hero.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroConfig {
    /// Locator of the sequence manifest, relative to the frame source root.
    pub manifest_path: String,
    /// CSS pixels of scrolling per frame.
    pub scrub_distance: f64,
    /// Document offset (CSS px) where the pinned region begins.
    pub pin_top: f64,
    /// Horizontal crop bias used when the image is cropped left/right.
    pub bias_x: f64,
    /// How the scrub value follows scroll progress.
    pub scrub: Scrub,
    /// Curve applied to scroll progress before mapping to frames.
    pub ease: Ease,
    /// Straight-alpha RGBA colour the canvas is cleared to before each draw.
    pub clear_rgba: [u8; 4],
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            manifest_path: "sequence/manifest.json".to_string(),
            scrub_distance: 10.0,
            pin_top: 0.0,
            bias_x: 0.75,
            scrub: Scrub::default(),
            ease: Ease::Linear,
            clear_rgba: [0, 0, 0, 255],
        }
    }
}

impl HeroConfig {
    /// Parse a JSON config and validate it.
    pub fn from_json_str(s: &str) -> ScrubResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| ScrubError::serde(format!("hero config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ScrubResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read hero config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Apply `SCRUBFRAME_*` environment overrides. Malformed values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let num = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        if let Some(v) = num("SCRUBFRAME_SCRUB_DISTANCE").filter(|&v| v > 0.0) {
            self.scrub_distance = v;
        }
        if let Some(v) = num("SCRUBFRAME_BIAS_X").filter(|v| (0.0..=1.0).contains(v)) {
            self.bias_x = v;
        }
        if let Some(v) = num("SCRUBFRAME_SCRUB_LAG").filter(|&v| v >= 0.0) {
            self.scrub = if v == 0.0 {
                Scrub::Instant
            } else {
                Scrub::Smoothed { lag_secs: v }
            };
        }
        self
    }

    /// Check ranges of all numeric fields.
    pub fn validate(&self) -> ScrubResult<()> {
        if self.manifest_path.trim().is_empty() {
            return Err(ScrubError::validation("manifestPath must be non-empty"));
        }
        if !self.scrub_distance.is_finite() || self.scrub_distance <= 0.0 {
            return Err(ScrubError::validation(
                "scrubDistance must be finite and > 0",
            ));
        }
        if !self.pin_top.is_finite() {
            return Err(ScrubError::validation("pinTop must be finite"));
        }
        if !(0.0..=1.0).contains(&self.bias_x) {
            return Err(ScrubError::validation("biasX must be within [0, 1]"));
        }
        self.scrub.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
