use crate::types::{Dimensions, Rgba32};

/// A display target mirroring one pixel buffer. The bridge uploads into it
/// and then applies, which marks it for the next render.
pub trait DisplaySurface {
    fn dimensions(&self) -> Dimensions;

    /// Copy a full frame. `pixels.len()` equals the surface pixel count.
    fn set_pixels(&mut self, pixels: &[Rgba32]);

    /// Mark the uploaded pixels as ready to render.
    fn apply(&mut self);

    /// Text shown next to the surface, e.g. the current frame number.
    fn set_caption(&mut self, _caption: &str) {}
}

/// CPU-side texture. A renderer takes the pixels with [`take_dirty`] and
/// pushes them to the GPU.
///
/// [`take_dirty`]: TextureSurface::take_dirty
#[derive(Debug, Clone)]
pub struct TextureSurface {
    dims: Dimensions,
    pixels: Vec<Rgba32>,
    dirty: bool,
    generation: u64,
    caption: String,
}

impl TextureSurface {
    pub fn new(dims: Dimensions) -> Self {
        TextureSurface {
            dims,
            pixels: vec![Rgba32::default(); dims.pixel_count().unwrap_or(0)],
            dirty: false,
            generation: 0,
            caption: String::new(),
        }
    }

    pub fn pixels(&self) -> &[Rgba32] {
        &self.pixels
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of `apply` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Pixels to render if anything was applied since the last call.
    pub fn take_dirty(&mut self) -> Option<&[Rgba32]> {
        if self.dirty {
            self.dirty = false;
            Some(&self.pixels)
        } else {
            None
        }
    }
}

impl DisplaySurface for TextureSurface {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn set_pixels(&mut self, pixels: &[Rgba32]) {
        self.pixels.clear();
        self.pixels.extend_from_slice(pixels);
    }

    fn apply(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }

    fn set_caption(&mut self, caption: &str) {
        self.caption.clear();
        self.caption.push_str(caption);
    }
}
