//! Fixed-size RGBA buffers whose backing storage never moves.
//!
//! The native library is handed a raw pointer into the buffer and writes a
//! whole frame through it. The storage is a boxed slice allocated once, and
//! nothing on this type can grow, shrink or replace it, so the address stays
//! valid until the buffer is dropped.

use crate::{
    error::BridgeError,
    types::{Dimensions, Plane, Rgba32},
};

pub struct PixelBuffer {
    plane: Plane,
    dims: Dimensions,
    pixels: Box<[Rgba32]>,
}

impl PixelBuffer {
    /// Allocate a buffer for `plane` filled with opaque black.
    pub fn new(plane: Plane, dims: Dimensions) -> Result<Self, BridgeError> {
        let len = dims.pixel_count().ok_or(BridgeError::InvalidDimensions {
            width: dims.width,
            height: dims.height,
        })?;
        let mut pixels = Vec::<Rgba32>::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| BridgeError::Allocation {
                plane,
                bytes: len * std::mem::size_of::<Rgba32>(),
            })?;
        pixels.resize(len, Rgba32::BLACK);
        let pixels = pixels.into_boxed_slice();
        log::trace!(
            "{} buffer new {:?} ({}, {} bytes)",
            plane,
            pixels.as_ptr(),
            dims,
            len * std::mem::size_of::<Rgba32>()
        );
        Ok(PixelBuffer {
            plane,
            dims,
            pixels,
        })
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Number of pixels. Always `width * height`.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(&*self.pixels)
    }

    pub fn pixels(&self) -> &[Rgba32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba32] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels[..])
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels[..])
    }

    /// Stable address of the first byte, for comparing across calls.
    pub fn as_ptr(&self) -> *const u8 {
        self.pixels.as_ptr() as *const u8
    }

    /// Pointer handed to the native library. Valid for `byte_len()` bytes of
    /// writes while the caller holds the `&mut` borrow.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.pixels.as_mut_ptr() as *mut u8
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("plane", &self.plane)
            .field("dims", &self.dims)
            .field("addr", &self.as_ptr())
            .finish()
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        log::trace!("{} buffer delete {:?}", self.plane, self.as_ptr());
    }
}
