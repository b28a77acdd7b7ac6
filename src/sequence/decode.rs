use std::sync::Arc;

use crate::foundation::error::{ScrubError, ScrubResult};

/// A decoded frame ready for compositing.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedFrame {
    /// Build a frame from straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> ScrubResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScrubError::decode("frame has zero width or height"));
        }
        if rgba8.len() != width as usize * height as usize * 4 {
            return Err(ScrubError::decode(format!(
                "frame byte length {} does not match {width}x{height} rgba8",
                rgba8.len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba8);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8),
        })
    }

    /// `width / height`.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Decode any format supported by the `image` crate into a [`PreparedFrame`].
pub fn decode_frame(bytes: &[u8]) -> ScrubResult<PreparedFrame> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ScrubError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedFrame::from_rgba8(width, height, rgba.into_raw())
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/decode.rs"]
mod tests;
