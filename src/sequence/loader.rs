use rayon::prelude::*;

use crate::{
    foundation::{
        core::FrameIndex,
        error::{ScrubError, ScrubResult},
    },
    sequence::{
        decode::{PreparedFrame, decode_frame},
        manifest::{SequenceManifest, locator_base},
        source::FrameSource,
    },
};

/// One frame load to issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRequest {
    /// Position of the frame within the sequence.
    pub index: usize,
    /// Locator passed to the [`FrameSource`].
    pub locator: String,
}

/// Build one request per frame, resolving locators next to the manifest.
pub fn frame_requests(manifest: &SequenceManifest, manifest_locator: &str) -> Vec<FrameRequest> {
    let base = locator_base(manifest_locator);
    (0..manifest.len())
        .map(|index| FrameRequest {
            index,
            locator: manifest.frame_locator(base, index),
        })
        .collect()
}

/// Fully-settled frame sequence. Slots whose load failed are empty.
#[derive(Clone, Debug, Default)]
pub struct FrameSet {
    frames: Vec<Option<PreparedFrame>>,
}

impl FrameSet {
    /// Number of slots (equals the manifest frame count).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the set has no slots.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, or `None` when out of range or the load failed.
    pub fn get(&self, index: FrameIndex) -> Option<&PreparedFrame> {
        self.frames.get(index.0).and_then(Option::as_ref)
    }

    /// Number of slots holding a decoded frame.
    pub fn loaded_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// Indices whose load failed.
    pub fn missing(&self) -> Vec<FrameIndex> {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_none())
            .map(|(i, _)| FrameIndex(i))
            .collect()
    }
}

/// Counts frame-load completions and yields the [`FrameSet`] exactly once.
///
/// Completions are applied one at a time; success and failure both count toward
/// readiness. Duplicate completions for a slot and completions after readiness are
/// ignored.
#[derive(Debug)]
pub struct LoadTracker {
    slots: Vec<Option<PreparedFrame>>,
    settled: Vec<bool>,
    completed: usize,
    ready: bool,
}

impl LoadTracker {
    /// Track `frame_count` outstanding loads. A tracker for zero frames never becomes ready.
    pub fn new(frame_count: usize) -> Self {
        Self {
            slots: vec![None; frame_count],
            settled: vec![false; frame_count],
            completed: 0,
            ready: false,
        }
    }

    /// Number of loads being tracked.
    pub fn expected(&self) -> usize {
        self.settled.len()
    }

    /// Number of distinct slots settled so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Whether the frame set has been handed out.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Record the outcome of the load for `index`.
    ///
    /// Returns the frame set on the completion that settles the last slot.
    pub fn complete(
        &mut self,
        index: usize,
        outcome: ScrubResult<PreparedFrame>,
    ) -> Option<FrameSet> {
        if self.ready {
            tracing::trace!(index, "completion after ready ignored");
            return None;
        }
        let Some(settled) = self.settled.get_mut(index) else {
            tracing::warn!(index, expected = self.expected(), "completion for unknown frame");
            return None;
        };
        if *settled {
            tracing::warn!(index, "duplicate completion ignored");
            return None;
        }
        *settled = true;
        self.completed += 1;

        match outcome {
            Ok(frame) => self.slots[index] = Some(frame),
            Err(err) => tracing::warn!(index, error = %err, "frame failed to load"),
        }

        if self.completed < self.expected() {
            return None;
        }
        self.ready = true;
        let set = FrameSet {
            frames: std::mem::take(&mut self.slots),
        };
        tracing::info!(
            frames = set.len(),
            loaded = set.loaded_count(),
            "frame set ready"
        );
        Some(set)
    }
}

/// Fetches manifests and frames from a [`FrameSource`].
#[derive(Clone, Debug)]
pub struct SequenceLoader<S> {
    source: S,
}

impl<S: FrameSource> SequenceLoader<S> {
    /// Load through `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and validate the manifest at `locator`.
    #[tracing::instrument(skip(self))]
    pub fn fetch_manifest(&self, locator: &str) -> ScrubResult<SequenceManifest> {
        let bytes = self
            .source
            .fetch(locator)
            .map_err(|e| ScrubError::manifest(format!("fetch '{locator}': {e}")))?;
        SequenceManifest::from_json_slice(&bytes)
    }

    /// Fetch and decode a single frame.
    pub fn fetch_frame(&self, request: &FrameRequest) -> ScrubResult<PreparedFrame> {
        let bytes = self.source.fetch(&request.locator)?;
        decode_frame(&bytes)
            .map_err(|e| ScrubError::decode(format!("'{}': {e}", request.locator)))
    }

    /// Issue every request concurrently and report each outcome to `on_complete`.
    ///
    /// Loads run on the rayon pool; `on_complete` runs on the calling thread, one
    /// completion at a time, in completion order.
    #[tracing::instrument(skip_all, fields(requests = requests.len()))]
    pub fn load(
        &self,
        requests: &[FrameRequest],
        mut on_complete: impl FnMut(usize, ScrubResult<PreparedFrame>),
    ) {
        std::thread::scope(|scope| {
            let (tx, rx) = std::sync::mpsc::channel();
            scope.spawn(move || {
                requests.par_iter().for_each_with(tx, |tx, req| {
                    // receiver only goes away if the caller's callback panicked
                    let _ = tx.send((req.index, self.fetch_frame(req)));
                });
            });
            for (index, outcome) in rx {
                on_complete(index, outcome);
            }
        });
    }

    /// Fetch the manifest at `manifest_locator` and load the whole sequence.
    pub fn load_sequence(
        &self,
        manifest_locator: &str,
    ) -> ScrubResult<(SequenceManifest, FrameSet)> {
        let manifest = self.fetch_manifest(manifest_locator)?;
        let requests = frame_requests(&manifest, manifest_locator);
        let mut tracker = LoadTracker::new(requests.len());
        let mut ready = None;
        self.load(&requests, |index, outcome| {
            if let Some(set) = tracker.complete(index, outcome) {
                ready = Some(set);
            }
        });
        let set = ready.ok_or_else(|| {
            ScrubError::manifest(format!(
                "sequence load settled {} of {} frames",
                tracker.completed(),
                tracker.expected()
            ))
        })?;
        Ok((manifest, set))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/loader.rs"]
mod tests;
