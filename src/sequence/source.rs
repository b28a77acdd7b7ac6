use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ScrubError, ScrubResult};

/// Fetches raw resource bytes (manifest JSON, encoded frames) by `/`-separated locator.
///
/// Fetches may run concurrently from the loader's worker pool.
pub trait FrameSource: Send + Sync {
    /// Fetch the full contents of `locator`.
    fn fetch(&self, locator: &str) -> ScrubResult<Vec<u8>>;
}

/// Serves locators from a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsFrameSource {
    root: PathBuf,
}

impl FsFrameSource {
    /// Serve files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory locators are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a locator, rejecting absolute and escaping locators.
    pub fn resolve(&self, locator: &str) -> ScrubResult<PathBuf> {
        let rel = normalize_locator(locator)?;
        Ok(self.root.join(rel))
    }
}

impl FrameSource for FsFrameSource {
    fn fetch(&self, locator: &str) -> ScrubResult<Vec<u8>> {
        let path = self.resolve(locator)?;
        let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
        Ok(bytes)
    }
}

/// Normalize a locator to a clean relative `/`-separated path.
///
/// Backslashes become `/`, empty and `.` segments are dropped, `..` and absolute
/// locators are rejected.
pub fn normalize_locator(locator: &str) -> ScrubResult<String> {
    let s = locator.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ScrubError::validation("locators must be relative"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ScrubError::validation("locators must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ScrubError::validation("locator must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/source.rs"]
mod tests;
