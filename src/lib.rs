//! scrubframe renders a scroll-scrubbed image sequence: the cinematic header of a
//! landing page where scrolling through a pinned region plays a numbered frame
//! sequence like a video.
//!
//! # Pipeline overview
//!
//! 1. **Load**: fetch a [`SequenceManifest`], issue one load per frame through a
//!    [`FrameSource`], and settle them into a [`FrameSet`] with a [`LoadTracker`].
//!    Failed frames leave gaps; they never block readiness.
//! 2. **Map**: a [`PinnedRegion`] turns scroll offset into progress, and a [`Scrubber`]
//!    turns progress into a continuous frame value in `[0, frame_count - 1]`.
//! 3. **Composite**: the [`Compositor`] rounds and clamps that value, cover-fits the
//!    frame into a [`Surface`] and draws it, or leaves the surface untouched when the
//!    frame is missing.
//! 4. **Resize**: viewport changes re-derive the backing resolution from the device
//!    pixel ratio and redraw the current frame.
//!
//! [`ScrollHero`] composes the four and is driven by host events ([`HostEvent`]),
//! with listeners scoped to its activation.
//!
//! The crate never installs a `tracing` subscriber; hosts do that once at startup.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod foundation;
mod hero;
mod render;
mod sequence;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;

pub use animation::ease::Ease;
pub use animation::scrub::{PinnedRegion, Scrub, Scrubber};
pub use foundation::config::HeroConfig;
pub use foundation::core::{Affine, FrameIndex, Rect, Size, Viewport};
pub use foundation::error::{ScrubError, ScrubResult};
pub use hero::component::{HeroStatus, ScrollHero};
pub use hero::events::{EventHub, EventKind, HostEvent, Listener};
pub use render::compositor::{Compositor, DrawOutcome, SkipReason};
pub use render::cover::{DEFAULT_BIAS_X, cover_rect};
pub use render::surface::{CpuSurface, DEFAULT_FRAME_CACHE_CAPACITY, Surface};
pub use sequence::decode::{PreparedFrame, decode_frame};
pub use sequence::loader::{FrameRequest, FrameSet, LoadTracker, SequenceLoader, frame_requests};
pub use sequence::manifest::{SequenceManifest, locator_base};
pub use sequence::source::{FrameSource, FsFrameSource, normalize_locator};
