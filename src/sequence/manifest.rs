use crate::foundation::error::{ScrubError, ScrubResult};

/// Upper bound on zero-pad width; wider than any `u64` decimal.
const MAX_DIGITS: u32 = 20;

/// Naming scheme and length of a numbered image sequence.
///
/// Frame `i` lives at `{base}/{file_prefix}{zero_pad(start_frame + i, digits)}.{file_extension}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SequenceManifest {
    /// Number of frames in the sequence; must be > 0.
    pub frame_count: u32,
    /// File name prefix shared by every frame.
    pub file_prefix: String,
    /// File extension without a leading dot.
    pub file_extension: String,
    /// Number of the first frame on disk.
    pub start_frame: u64,
    /// Zero-pad width of the frame number.
    pub digits: u32,
}

impl SequenceManifest {
    /// Parse manifest JSON and validate it.
    pub fn from_json_slice(bytes: &[u8]) -> ScrubResult<Self> {
        let manifest: Self = serde_json::from_slice(bytes)
            .map_err(|e| ScrubError::manifest(format!("invalid manifest json: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check field ranges.
    pub fn validate(&self) -> ScrubResult<()> {
        if self.frame_count == 0 {
            return Err(ScrubError::manifest("frameCount must be > 0"));
        }
        if self.digits == 0 || self.digits > MAX_DIGITS {
            return Err(ScrubError::manifest(format!(
                "digits must be within 1..={MAX_DIGITS}"
            )));
        }
        if self.file_extension.is_empty() {
            return Err(ScrubError::manifest("fileExtension must be non-empty"));
        }
        if self.file_extension.starts_with('.') {
            return Err(ScrubError::manifest(
                "fileExtension must not start with '.'",
            ));
        }
        if self
            .file_prefix
            .chars()
            .chain(self.file_extension.chars())
            .any(|c| c == '\\' || c.is_control())
        {
            return Err(ScrubError::manifest(
                "filePrefix/fileExtension contain invalid characters",
            ));
        }
        if self
            .start_frame
            .checked_add(u64::from(self.frame_count) - 1)
            .is_none()
        {
            return Err(ScrubError::manifest("frame numbers overflow u64"));
        }
        Ok(())
    }

    /// Number of frames as a `usize`.
    pub fn len(&self) -> usize {
        self.frame_count as usize
    }

    /// Whether the sequence has no frames.
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// File name of frame `index` (0-based, relative to the sequence start).
    pub fn frame_file_name(&self, index: usize) -> String {
        let number = self.start_frame.saturating_add(index as u64);
        format!(
            "{}{:0width$}.{}",
            self.file_prefix,
            number,
            self.file_extension,
            width = self.digits as usize
        )
    }

    /// Locator of frame `index` under `base` (a `/`-separated directory, possibly empty).
    pub fn frame_locator(&self, base: &str, index: usize) -> String {
        let name = self.frame_file_name(index);
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            name
        } else {
            format!("{base}/{name}")
        }
    }

    /// Locators for every frame, in sequence order.
    pub fn frame_locators(&self, base: &str) -> Vec<String> {
        (0..self.len())
            .map(|i| self.frame_locator(base, i))
            .collect()
    }
}

/// Directory part of a `/`-separated locator (`"a/b/m.json" -> "a/b"`, `"m.json" -> ""`).
pub fn locator_base(locator: &str) -> &str {
    locator.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/manifest.rs"]
mod tests;
