//! A software device for running the bridge without camera hardware.
//!
//! RGB frames are a moving gradient. Disparity frames are a moving ramp run
//! through the same kind of colormap the device uses for disparity output.

use std::{
    ffi::CStr,
    sync::{Arc, Mutex},
};

use crate::{
    device::DeviceApi,
    error::RefillError,
    pixel_buffer::PixelBuffer,
    types::{Dimensions, FrameNumber, Plane, Rgba32},
};

/// Disparity range with extended disparity enabled.
pub const MAX_DISPARITY: f32 = 190.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    StartDevice { rgb: Dimensions, storage_path: String },
    StartDeviceRecordVideo { rgb: Dimensions, storage_path: String },
    RgbImage { addr: usize },
    ColorDisparityImage { addr: usize },
    VideoFrames,
    StopDevice,
}

/// Shared view of the calls a [`SyntheticDevice`] received. Stays readable
/// after the device itself is dropped.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}
impl CallLog {
    fn push(&self, call: DeviceCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn snapshot(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|&c| pred(c)).count()
    }
}

#[derive(Debug, Default)]
pub struct SyntheticDevice {
    start_status: i32,
    started: bool,
    rgb_seq: u32,
    disparity_seq: u32,
    video_frames: u64,
    rgb_failures: u32,
    disparity_failures: u32,
    log: CallLog,
}

impl SyntheticDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status reported by the recording start call.
    pub fn with_start_status(mut self, status: i32) -> Self {
        self.start_status = status;
        self
    }

    /// Make the next `count` refills of `plane` fail.
    pub fn fail_next(&mut self, plane: Plane, count: u32) {
        match plane {
            Plane::Rgb => self.rgb_failures = count,
            Plane::Disparity => self.disparity_failures = count,
        }
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    fn check_refill(&mut self, plane: Plane) -> Result<(), RefillError> {
        if !self.started {
            return Err(RefillError::Device {
                plane,
                reason: "device not started".to_owned(),
            });
        }
        let failures = match plane {
            Plane::Rgb => &mut self.rgb_failures,
            Plane::Disparity => &mut self.disparity_failures,
        };
        if *failures > 0 {
            *failures -= 1;
            return Err(RefillError::Device {
                plane,
                reason: "injected failure".to_owned(),
            });
        }
        Ok(())
    }
}

impl DeviceApi for SyntheticDevice {
    fn start_device(&mut self, rgb: Dimensions, storage_path: &CStr) {
        self.log.push(DeviceCall::StartDevice {
            rgb,
            storage_path: storage_path.to_string_lossy().into_owned(),
        });
        self.started = true;
    }

    fn start_device_record_video(&mut self, rgb: Dimensions, storage_path: &CStr) -> i32 {
        self.log.push(DeviceCall::StartDeviceRecordVideo {
            rgb,
            storage_path: storage_path.to_string_lossy().into_owned(),
        });
        self.started = self.start_status == 0;
        self.start_status
    }

    fn rgb_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError> {
        self.log.push(DeviceCall::RgbImage {
            addr: buffer.as_ptr() as usize,
        });
        self.check_refill(Plane::Rgb)?;
        let seq = self.rgb_seq;
        draw_gradient(buffer, seq);
        self.rgb_seq += 1;
        Ok(FrameNumber::from(seq))
    }

    fn color_disparity_image(&mut self, buffer: &mut PixelBuffer) -> Result<FrameNumber, RefillError> {
        self.log.push(DeviceCall::ColorDisparityImage {
            addr: buffer.as_ptr() as usize,
        });
        self.check_refill(Plane::Disparity)?;
        let seq = self.disparity_seq;
        draw_disparity_ramp(buffer, seq);
        self.disparity_seq += 1;
        Ok(FrameNumber::from(seq))
    }

    fn video_frames(&mut self) -> u64 {
        self.log.push(DeviceCall::VideoFrames);
        if self.started {
            self.video_frames += 1;
        }
        self.video_frames
    }

    fn stop_device(&mut self) {
        self.log.push(DeviceCall::StopDevice);
        self.started = false;
    }
}

fn draw_gradient(buffer: &mut PixelBuffer, seq: u32) {
    let Dimensions { width, .. } = buffer.dimensions();
    for (i, pixel) in buffer.pixels_mut().iter_mut().enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        *pixel = Rgba32::new(
            x.wrapping_add(seq.wrapping_mul(4)) as u8,
            y.wrapping_add(seq.wrapping_mul(2)) as u8,
            (x ^ y).wrapping_add(seq) as u8,
            255,
        );
    }
}

fn draw_disparity_ramp(buffer: &mut PixelBuffer, seq: u32) {
    let Dimensions { width, .. } = buffer.dimensions();
    let width = width as usize;
    for (i, pixel) in buffer.pixels_mut().iter_mut().enumerate() {
        let x = (i % width + seq as usize) % width;
        let disparity = (x as f32 * MAX_DISPARITY / width as f32) as u8;
        *pixel = colorize_disparity(disparity, MAX_DISPARITY);
    }
}

/// Map a disparity value onto a JET colormap: near is red, far is blue.
pub fn colorize_disparity(disparity: u8, max_disparity: f32) -> Rgba32 {
    let t = (disparity as f32 / max_disparity).max(0.0).min(1.0);
    let channel = |offset: f32| {
        let v = 1.5 - (4.0 * t - offset).abs();
        (v.max(0.0).min(1.0) * 255.0).round() as u8
    };
    Rgba32::new(channel(3.0), channel(2.0), channel(1.0), 255)
}
