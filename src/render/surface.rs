use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    foundation::{
        core::{Affine, FrameIndex, Rect, Size, Viewport},
        error::{ScrubError, ScrubResult},
    },
    sequence::decode::PreparedFrame,
};

/// Drawing target for the compositor.
///
/// Draw coordinates are CSS pixels; implementations map them onto their backing
/// store using the viewport's device pixel ratio.
pub trait Surface {
    /// Re-derive the backing resolution from `viewport`.
    fn resize(&mut self, viewport: Viewport) -> ScrubResult<()>;

    /// Viewport last applied through [`Surface::resize`].
    fn viewport(&self) -> Option<Viewport>;

    /// Fill the whole surface with a straight-alpha RGBA8 colour.
    fn clear(&mut self, rgba: [u8; 4]);

    /// Draw `frame` scaled into `dst` (CSS pixels). `index` identifies the frame for caching.
    fn draw_frame(
        &mut self,
        index: FrameIndex,
        frame: &PreparedFrame,
        dst: Rect,
    ) -> ScrubResult<()>;

    /// Visible size in CSS pixels; the surface always spans its container.
    fn css_size(&self) -> Size {
        self.viewport()
            .map(|vp| vp.css_size())
            .unwrap_or(Size::ZERO)
    }
}

/// CPU canvas backed by a `vello_cpu` pixmap holding premultiplied RGBA8.
pub struct CpuSurface {
    viewport: Option<Viewport>,
    width: u16,
    height: u16,
    background: [u8; 4],
    pixmap: vello_cpu::Pixmap,
    frame_cache: HashMap<FrameIndex, CachedFrame>,
    lru: VecDeque<FrameIndex>,
    cache_capacity: usize,
}

/// Frame images kept by a [`CpuSurface`] unless `SCRUBFRAME_FRAME_CACHE_CAPACITY` says
/// otherwise.
pub const DEFAULT_FRAME_CACHE_CAPACITY: usize = 64;

struct CachedFrame {
    source: Arc<Vec<u8>>,
    image: vello_cpu::Image,
}

impl Default for CpuSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSurface {
    /// A 1x1 transparent surface; call [`Surface::resize`] before drawing.
    ///
    /// The frame image cache holds `SCRUBFRAME_FRAME_CACHE_CAPACITY` entries (default
    /// [`DEFAULT_FRAME_CACHE_CAPACITY`]).
    pub fn new() -> Self {
        let capacity = std::env::var("SCRUBFRAME_FRAME_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_FRAME_CACHE_CAPACITY);
        Self::with_cache_capacity(capacity)
    }

    /// A surface caching at most `capacity` frame images (at least one).
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            viewport: None,
            width: 1,
            height: 1,
            background: [0, 0, 0, 0],
            pixmap: vello_cpu::Pixmap::new(1, 1),
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
            cache_capacity: capacity.max(1),
        }
    }

    /// Number of frame images currently cached.
    pub fn cached_frames(&self) -> usize {
        self.frame_cache.len()
    }

    /// Backing-store resolution in physical pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Premultiplied RGBA8 bytes of the backing store, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Premultiplied RGBA8 at backing pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= u32::from(self.width) || y >= u32::from(self.height) {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data().get(off..off + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Drop cached frame images.
    pub fn forget_frames(&mut self) {
        self.frame_cache.clear();
        self.lru.clear();
    }

    fn touch(&mut self, index: FrameIndex) {
        if let Some(pos) = self.lru.iter().position(|&k| k == index) {
            self.lru.remove(pos);
        }
        self.lru.push_back(index);
    }

    fn evict_if_needed(&mut self) {
        while self.frame_cache.len() > self.cache_capacity {
            let Some(old) = self.lru.pop_front() else {
                break;
            };
            self.frame_cache.remove(&old);
        }
    }

    fn image_for(
        &mut self,
        index: FrameIndex,
        frame: &PreparedFrame,
    ) -> ScrubResult<vello_cpu::Image> {
        if let Some(cached) = self.frame_cache.get(&index)
            && Arc::ptr_eq(&cached.source, &frame.rgba8_premul)
        {
            let image = cached.image.clone();
            self.touch(index);
            return Ok(image);
        }

        let pixmap = frame_to_pixmap(frame)?;
        let image = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.frame_cache.insert(
            index,
            CachedFrame {
                source: Arc::clone(&frame.rgba8_premul),
                image: image.clone(),
            },
        );
        self.touch(index);
        self.evict_if_needed();
        Ok(image)
    }
}

impl Surface for CpuSurface {
    #[tracing::instrument(skip(self))]
    fn resize(&mut self, viewport: Viewport) -> ScrubResult<()> {
        viewport.validate()?;
        let (w, h) = viewport.backing_size();
        let width: u16 = w
            .try_into()
            .map_err(|_| ScrubError::render("backing width exceeds u16"))?;
        let height: u16 = h
            .try_into()
            .map_err(|_| ScrubError::render("backing height exceeds u16"))?;

        if width != self.width || height != self.height {
            self.pixmap = vello_cpu::Pixmap::new(width, height);
            self.width = width;
            self.height = height;
        }
        self.viewport = Some(viewport);
        tracing::debug!(width, height, dpr = viewport.dpr, "surface resized");
        Ok(())
    }

    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        self.background = rgba;
        let [r, g, b, a] = rgba;
        let premul = premul_rgba8(r, g, b, a);
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    fn draw_frame(
        &mut self,
        index: FrameIndex,
        frame: &PreparedFrame,
        dst: Rect,
    ) -> ScrubResult<()> {
        let viewport = self
            .viewport
            .ok_or_else(|| ScrubError::render("surface drawn before first resize"))?;
        let image = self.image_for(index, frame)?;

        let (fw, fh) = (f64::from(frame.width), f64::from(frame.height));
        let placement = viewport.css_to_backing()
            * Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / fw, dst.height() / fh);

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // repaint the background in-scene so the result does not depend on how the
        // pixmap's previous contents are treated
        let [r, g, b, a] = self.background;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        ctx.set_transform(vello_cpu::kurbo::Affine::new(placement.as_coeffs()));
        ctx.set_paint(image);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, fw, fh));

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        tracing::trace!(index = index.0, "frame drawn");
        Ok(())
    }
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = (a as u16) + 1;
    let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn frame_to_pixmap(frame: &PreparedFrame) -> ScrubResult<vello_cpu::Pixmap> {
    let w: u16 = frame
        .width
        .try_into()
        .map_err(|_| ScrubError::render("frame width exceeds u16"))?;
    let h: u16 = frame
        .height
        .try_into()
        .map_err(|_| ScrubError::render("frame height exceeds u16"))?;
    let bytes = frame.rgba8_premul.as_slice();
    if bytes.len() != frame.width as usize * frame.height as usize * 4 {
        return Err(ScrubError::render("prepared frame byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(bytes.len() / 4);
    for px in bytes.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
