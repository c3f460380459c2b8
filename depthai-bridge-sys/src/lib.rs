//! Raw bindings to `depthai_android_api`, the native DepthAI device library
//! shipped with the Android build.
//!
//! Image getters copy a full RGBA frame into the caller's buffer, so the
//! pointer must reference at least the number of bytes reported by
//! [`rgb_image_byte_len`] or [`color_disparity_image_byte_len`].

extern crate link_cplusplus;

use std::os::raw::{c_char, c_int, c_uint, c_ulonglong};

/// Disparity frames are always produced at the 400P mono sensor size.
pub const NATIVE_DISPARITY_WIDTH: c_int = 640;
pub const NATIVE_DISPARITY_HEIGHT: c_int = 400;

/// Bytes per pixel written by the image getters (R, G, B, 255).
pub const NATIVE_BYTES_PER_PIXEL: usize = 4;

extern "C" {
    /// Legacy start path: builds the preview pipeline and opens the device.
    pub fn api_start_device(rgb_width: c_int, rgb_height: c_int, external_storage_path: *const c_char);

    /// Start the device and its video encoders. Returns 0 on success.
    pub fn api_start_device_record_video(
        rgb_width: c_int,
        rgb_height: c_int,
        external_storage_path: *const c_char,
    ) -> c_int;

    /// Block for the next RGB frame and copy it into `rgb_image`. Returns the
    /// frame sequence number.
    pub fn api_get_rgb_image(rgb_image: *mut u8) -> c_uint;

    /// Block for the next disparity frame, colorize it and copy it into
    /// `disparity_image`. Returns the frame sequence number.
    pub fn api_get_color_disparity_image(disparity_image: *mut u8) -> c_uint;

    /// Drain one packet from every encoder queue. Returns the running video
    /// frame count.
    pub fn api_get_video_frames() -> c_ulonglong;

    pub fn api_stop_device();
}

/// Bytes `api_get_rgb_image` writes for a device started at the given size.
pub const fn rgb_image_byte_len(rgb_width: c_int, rgb_height: c_int) -> usize {
    rgb_width as usize * rgb_height as usize * NATIVE_BYTES_PER_PIXEL
}

/// Bytes `api_get_color_disparity_image` writes.
pub const fn color_disparity_image_byte_len() -> usize {
    NATIVE_DISPARITY_WIDTH as usize * NATIVE_DISPARITY_HEIGHT as usize * NATIVE_BYTES_PER_PIXEL
}
