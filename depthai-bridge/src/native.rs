//! `DeviceApi` backed by the prebuilt `depthai_android_api` library.
//!
//! The native getters copy a fixed number of bytes into whatever pointer
//! they are given, so every refill checks the buffer against that count
//! first.

use std::{convert::TryFrom, os::raw::c_int};

use depthai_bridge_sys as sys;

use crate::{
    error::RefillError,
    pixel_buffer::PixelBuffer,
    types::{Dimensions, Plane},
};

/// Bytes the native getter for `plane` writes once the device was started
/// with `rgb` as its preview size.
pub fn native_refill_bytes(plane: Plane, rgb: Dimensions) -> usize {
    match plane {
        Plane::Rgb => match (c_int::try_from(rgb.width), c_int::try_from(rgb.height)) {
            (Ok(width), Ok(height)) => sys::rgb_image_byte_len(width, height),
            _ => usize::MAX,
        },
        Plane::Disparity => sys::color_disparity_image_byte_len(),
    }
}

/// Reject buffers the native side would overrun.
pub fn check_capacity(buffer: &PixelBuffer, required: usize) -> Result<(), RefillError> {
    if buffer.byte_len() < required {
        return Err(RefillError::BufferTooSmall {
            plane: buffer.plane(),
            required,
            actual: buffer.byte_len(),
        });
    }
    Ok(())
}

#[cfg(feature = "native")]
pub use self::device::NativeDevice;

#[cfg(feature = "native")]
mod device {
    use std::{ffi::CStr, os::raw::c_int};

    use depthai_bridge_sys as sys;

    use super::{check_capacity, native_refill_bytes};
    use crate::{
        device::DeviceApi,
        error::RefillError,
        pixel_buffer::PixelBuffer,
        types::{Dimensions, FrameNumber, Plane},
    };

    /// Handle to the process-wide native session. The library keeps its
    /// device in globals, so only one of these should be connected at a time.
    #[derive(Debug, Default)]
    pub struct NativeDevice {
        started_rgb: Option<Dimensions>,
    }

    impl NativeDevice {
        pub fn new() -> Self {
            Self::default()
        }

        fn prepare(&self, buffer: &PixelBuffer) -> Result<(), RefillError> {
            let rgb = self.started_rgb.ok_or_else(|| RefillError::Device {
                plane: buffer.plane(),
                reason: "device not started".to_owned(),
            })?;
            check_capacity(buffer, native_refill_bytes(buffer.plane(), rgb))
        }
    }

    fn c_dims(rgb: Dimensions) -> (c_int, c_int) {
        (rgb.width as c_int, rgb.height as c_int)
    }

    impl DeviceApi for NativeDevice {
        fn start_device(&mut self, rgb: Dimensions, storage_path: &CStr) {
            let (width, height) = c_dims(rgb);
            log::trace!("api_start_device({}, {}, {:?})", width, height, storage_path);
            unsafe { sys::api_start_device(width, height, storage_path.as_ptr()) }
            self.started_rgb = Some(rgb);
        }

        fn start_device_record_video(&mut self, rgb: Dimensions, storage_path: &CStr) -> i32 {
            let (width, height) = c_dims(rgb);
            log::trace!(
                "api_start_device_record_video({}, {}, {:?})",
                width,
                height,
                storage_path
            );
            let status =
                unsafe { sys::api_start_device_record_video(width, height, storage_path.as_ptr()) };
            if status == 0 {
                self.started_rgb = Some(rgb);
            }
            status
        }

        fn rgb_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError> {
            debug_assert_eq!(buffer.plane(), Plane::Rgb);
            self.prepare(buffer)?;
            let ptr = buffer.as_mut_ptr();
            log::trace!("api_get_rgb_image({:?})", ptr);
            Ok(FrameNumber::from(unsafe { sys::api_get_rgb_image(ptr) }))
        }

        fn color_disparity_image(
            &mut self,
            buffer: &mut PixelBuffer,
        ) -> Result<FrameNumber, RefillError> {
            debug_assert_eq!(buffer.plane(), Plane::Disparity);
            self.prepare(buffer)?;
            let ptr = buffer.as_mut_ptr();
            log::trace!("api_get_color_disparity_image({:?})", ptr);
            Ok(FrameNumber::from(unsafe {
                sys::api_get_color_disparity_image(ptr)
            }))
        }

        fn video_frames(&mut self) -> u64 {
            unsafe { sys::api_get_video_frames() }
        }

        fn stop_device(&mut self) {
            log::trace!("api_stop_device()");
            unsafe { sys::api_stop_device() }
            self.started_rgb = None;
        }
    }
}
