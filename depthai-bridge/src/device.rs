use std::ffi::CStr;

use crate::{
    error::RefillError,
    pixel_buffer::PixelBuffer,
    types::{Dimensions, FrameNumber},
};

/// The native device-control entry points, one method per call.
///
/// Image getters write a full RGBA frame into the given buffer in place and
/// return the frame's sequence number. They may block until a frame is ready.
pub trait DeviceApi {
    /// Legacy start. Reports nothing back.
    fn start_device(&mut self, rgb: Dimensions, storage_path: &CStr);

    /// Start with recording. Returns the native status, 0 on success.
    fn start_device_record_video(&mut self, rgb: Dimensions, storage_path: &CStr) -> i32;

    fn rgb_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError>;

    fn color_disparity_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError>;

    /// Running count of recorded video frames.
    fn video_frames(&mut self) -> u64;

    fn stop_device(&mut self);
}

impl<D: DeviceApi + ?Sized> DeviceApi for Box<D> {
    fn start_device(&mut self, rgb: Dimensions, storage_path: &CStr) {
        (**self).start_device(rgb, storage_path)
    }
    fn start_device_record_video(&mut self, rgb: Dimensions, storage_path: &CStr) -> i32 {
        (**self).start_device_record_video(rgb, storage_path)
    }
    fn rgb_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError> {
        (**self).rgb_image(buffer)
    }
    fn color_disparity_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError> {
        (**self).color_disparity_image(buffer)
    }
    fn video_frames(&mut self) -> u64 {
        (**self).video_frames()
    }
    fn stop_device(&mut self) {
        (**self).stop_device()
    }
}
