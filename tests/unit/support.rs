//! Shared fixtures for unit tests.

use crate::{
    foundation::{
        core::{FrameIndex, Rect, Viewport},
        error::{ScrubError, ScrubResult},
    },
    render::surface::Surface,
    sequence::{decode::PreparedFrame, loader::FrameSet, loader::LoadTracker},
};

/// A call observed by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Resize(Viewport),
    Clear([u8; 4]),
    Draw(FrameIndex, Rect),
}

/// Surface that records calls instead of rasterizing.
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub(crate) viewport: Option<Viewport>,
    pub(crate) calls: Vec<Call>,
}

impl RecordingSurface {
    pub(crate) fn draws(&self) -> Vec<FrameIndex> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(i, _) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn backing_size(&self) -> Option<(u32, u32)> {
        self.viewport.map(|vp| vp.backing_size())
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, viewport: Viewport) -> ScrubResult<()> {
        viewport.validate()?;
        self.viewport = Some(viewport);
        self.calls.push(Call::Resize(viewport));
        Ok(())
    }

    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        self.calls.push(Call::Clear(rgba));
    }

    fn draw_frame(
        &mut self,
        index: FrameIndex,
        _frame: &PreparedFrame,
        dst: Rect,
    ) -> ScrubResult<()> {
        self.calls.push(Call::Draw(index, dst));
        Ok(())
    }
}

pub(crate) fn solid_frame(w: u32, h: u32) -> PreparedFrame {
    PreparedFrame::from_rgba8(w, h, vec![200; w as usize * h as usize * 4])
        .expect("valid frame")
}

/// Settled frame set; `false` entries are failed loads.
pub(crate) fn frame_set(w: u32, h: u32, loaded: &[bool]) -> FrameSet {
    let mut tracker = LoadTracker::new(loaded.len());
    let mut out = None;
    for (i, ok) in loaded.iter().enumerate() {
        let outcome = if *ok {
            Ok(solid_frame(w, h))
        } else {
            Err(ScrubError::decode("fixture failure"))
        };
        if let Some(set) = tracker.complete(i, outcome) {
            out = Some(set);
        }
    }
    out.unwrap_or_default()
}
