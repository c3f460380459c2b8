//! The frame bridge: two pinned pixel buffers, the device that refills them,
//! and the display surfaces that mirror them.

use std::{ffi::CString, fmt, path::Path};

use crate::{
    config::BridgeConfig,
    device::DeviceApi,
    error::{BridgeError, RefillError},
    pixel_buffer::PixelBuffer,
    surface::{DisplaySurface, TextureSurface},
    types::{ConnectVariant, Dimensions, FrameNumber, OperatingMode, Plane},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Buffers and surfaces exist, the device has not been started.
    Initialized,
    /// The device was started and ticks refill the buffers.
    Connected,
}

/// Outcome of refilling one plane.
pub type PlaneUpdate = Result<FrameNumber, RefillError>;

/// What a single display tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Not connected, nothing was touched.
    Idle,
    Refreshed {
        rgb: PlaneUpdate,
        disparity: PlaneUpdate,
    },
    /// Counter-only mode: no pixels moved.
    Counted { video_frames: u64 },
}
impl Tick {
    pub fn frame(&self, plane: Plane) -> Option<FrameNumber> {
        match (self, plane) {
            (Tick::Refreshed { rgb, .. }, Plane::Rgb) => rgb.as_ref().ok().copied(),
            (Tick::Refreshed { disparity, .. }, Plane::Disparity) => {
                disparity.as_ref().ok().copied()
            }
            _ => None,
        }
    }

    pub fn refreshed_planes(&self) -> usize {
        match self {
            Tick::Refreshed { rgb, disparity } => {
                rgb.is_ok() as usize + disparity.is_ok() as usize
            }
            _ => 0,
        }
    }

    pub fn failed_planes(&self) -> usize {
        match self {
            Tick::Refreshed { rgb, disparity } => {
                rgb.is_err() as usize + disparity.is_err() as usize
            }
            _ => 0,
        }
    }
}
impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn plane(f: &mut fmt::Formatter<'_>, plane: Plane, update: &PlaneUpdate) -> fmt::Result {
            match update {
                Ok(frame) => write!(f, "{} Frame: {}", plane, frame),
                Err(_) => write!(f, "{} Frame: skipped", plane),
            }
        }
        match self {
            Tick::Idle => f.write_str("idle"),
            Tick::Refreshed { rgb, disparity } => {
                plane(f, Plane::Rgb, rgb)?;
                f.write_str(" | ")?;
                plane(f, Plane::Disparity, disparity)
            }
            Tick::Counted { video_frames } => write!(f, "Video Frames: {}", video_frames),
        }
    }
}

struct Binding<S> {
    buffer: PixelBuffer,
    surface: S,
    last_frame: Option<FrameNumber>,
}
impl<S: DisplaySurface> Binding<S> {
    fn new(
        plane: Plane,
        dims: Dimensions,
        bind: &mut impl FnMut(Plane, Dimensions) -> S,
    ) -> Result<Self, BridgeError> {
        let buffer = PixelBuffer::new(plane, dims)?;
        let mut surface = bind(plane, dims);
        if surface.dimensions() != dims {
            return Err(BridgeError::SurfaceMismatch {
                plane,
                expected: dims,
                actual: surface.dimensions(),
            });
        }
        surface.set_pixels(buffer.pixels());
        surface.apply();
        Ok(Binding {
            buffer,
            surface,
            last_frame: None,
        })
    }

    fn refresh(
        &mut self,
        fetch: impl FnOnce(&mut PixelBuffer) -> Result<FrameNumber, RefillError>,
    ) -> PlaneUpdate {
        let plane = self.buffer.plane();
        match fetch(&mut self.buffer) {
            Ok(frame) => {
                if let Some(last) = self.last_frame {
                    if frame < last {
                        log::warn!("{}: frame number went backwards ({} -> {})", plane, last, frame);
                    }
                }
                self.last_frame = Some(frame);
                self.surface.set_pixels(self.buffer.pixels());
                self.surface.apply();
                self.surface
                    .set_caption(&format!("{} Frame: {}", plane, frame));
                Ok(frame)
            }
            Err(err) => {
                log::warn!("{}: skipping surface update: {}", plane, err);
                Err(err)
            }
        }
    }
}

/// Adapter between a device and two display surfaces.
///
/// Construction allocates and binds both planes. [`connect`] starts the
/// device once, after which every [`tick`] asks the device to refill the
/// buffers in place and uploads them. Dropping the bridge stops the device
/// before the buffers are freed.
///
/// [`connect`]: FrameBridge::connect
/// [`tick`]: FrameBridge::tick
pub struct FrameBridge<D: DeviceApi, S: DisplaySurface = TextureSurface> {
    mode: OperatingMode,
    connect_variant: ConnectVariant,
    state: SessionState,
    device: D,
    rgb: Binding<S>,
    disparity: Binding<S>,
}

impl<D: DeviceApi> FrameBridge<D, TextureSurface> {
    /// Initialize with CPU-side [`TextureSurface`]s.
    pub fn with_textures(config: &BridgeConfig, device: D) -> Result<Self, BridgeError> {
        Self::initialize(config, device, |_, dims| TextureSurface::new(dims))
    }
}

impl<D: DeviceApi, S: DisplaySurface> FrameBridge<D, S> {
    /// Allocate both planes and bind each to the surface `bind` returns for
    /// it. Surfaces start out showing the buffers' initial contents.
    pub fn initialize(
        config: &BridgeConfig,
        device: D,
        mut bind: impl FnMut(Plane, Dimensions) -> S,
    ) -> Result<Self, BridgeError> {
        let rgb = Binding::new(Plane::Rgb, config.rgb, &mut bind)?;
        let disparity = Binding::new(Plane::Disparity, config.disparity, &mut bind)?;
        log::debug!(
            "frame bridge initialized: rgb {} at {:?}, disparity {} at {:?}, {:?}",
            config.rgb,
            rgb.buffer.as_ptr(),
            config.disparity,
            disparity.buffer.as_ptr(),
            config.mode
        );
        Ok(FrameBridge {
            mode: config.mode,
            connect_variant: config.connect,
            state: SessionState::Initialized,
            device,
            rgb,
            disparity,
        })
    }

    /// Start the device at the RGB plane's size. A non-zero start status is
    /// returned as [`BridgeError::ConnectFailed`] and leaves the bridge
    /// initialized.
    pub fn connect(&mut self, storage_path: &Path) -> Result<(), BridgeError> {
        if self.state == SessionState::Connected {
            return Err(BridgeError::AlreadyConnected);
        }
        let storage_path_cstr = CString::new(storage_path.to_string_lossy().into_owned())
            .map_err(|_| BridgeError::InvalidStoragePath)?;
        let rgb = self.rgb.buffer.dimensions();

        match self.connect_variant {
            ConnectVariant::Start => self.device.start_device(rgb, &storage_path_cstr),
            ConnectVariant::StartWithRecording => {
                let status = self
                    .device
                    .start_device_record_video(rgb, &storage_path_cstr);
                if status != 0 {
                    log::error!("device start failed with status {}", status);
                    return Err(BridgeError::ConnectFailed { status });
                }
            }
        }
        self.state = SessionState::Connected;
        log::info!(
            "device connected ({:?}, rgb {}, storage {})",
            self.connect_variant,
            rgb,
            storage_path.display()
        );
        Ok(())
    }

    /// Run one display frame. Does nothing until connected.
    pub fn tick(&mut self) -> Tick {
        if self.state != SessionState::Connected {
            return Tick::Idle;
        }
        match self.mode {
            OperatingMode::FullRefill => {
                let device = &mut self.device;
                let rgb = self.rgb.refresh(|buffer| device.rgb_image(buffer));
                let disparity = self
                    .disparity
                    .refresh(|buffer| device.color_disparity_image(buffer));
                Tick::Refreshed { rgb, disparity }
            }
            OperatingMode::FrozenCounter => {
                let video_frames = self.device.video_frames();
                log::trace!("video frames: {}", video_frames);
                Tick::Counted { video_frames }
            }
        }
    }

    /// Stop the device. No-op unless connected.
    pub fn disconnect(&mut self) {
        if self.state != SessionState::Connected {
            return;
        }
        self.device.stop_device();
        self.state = SessionState::Initialized;
        self.rgb.last_frame = None;
        self.disparity.last_frame = None;
        log::info!("device disconnected");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn rgb_buffer(&self) -> &PixelBuffer {
        &self.rgb.buffer
    }

    pub fn disparity_buffer(&self) -> &PixelBuffer {
        &self.disparity.buffer
    }

    pub fn rgb_surface(&self) -> &S {
        &self.rgb.surface
    }

    pub fn disparity_surface(&self) -> &S {
        &self.disparity.surface
    }

    pub fn surface_mut(&mut self, plane: Plane) -> &mut S {
        match plane {
            Plane::Rgb => &mut self.rgb.surface,
            Plane::Disparity => &mut self.disparity.surface,
        }
    }

    /// Last frame number shown on `plane` since connecting.
    pub fn last_frame(&self, plane: Plane) -> Option<FrameNumber> {
        match plane {
            Plane::Rgb => self.rgb.last_frame,
            Plane::Disparity => self.disparity.last_frame,
        }
    }

    /// Bytes held by both pixel buffers.
    pub fn footprint_bytes(&self) -> usize {
        self.rgb.buffer.byte_len() + self.disparity.buffer.byte_len()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: DeviceApi, S: DisplaySurface> Drop for FrameBridge<D, S> {
    fn drop(&mut self) {
        log::trace!("frame bridge delete");
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        synthetic::{DeviceCall, SyntheticDevice},
        types::{Profile, Rgba32},
    };

    fn small_config() -> BridgeConfig {
        BridgeConfig {
            rgb: Dimensions::new(16, 12),
            disparity: Dimensions::new(16, 10),
            mode: OperatingMode::FullRefill,
            connect: ConnectVariant::StartWithRecording,
            storage_path: PathBuf::from("/sdcard"),
        }
    }

    fn connected(config: &BridgeConfig) -> FrameBridge<SyntheticDevice> {
        let mut bridge = FrameBridge::with_textures(config, SyntheticDevice::new()).unwrap();
        bridge.connect(&config.storage_path).unwrap();
        bridge
    }

    #[test]
    fn buffers_match_dimensions_and_never_move() {
        for &(rgb, disparity) in &[
            (Dimensions::new(1, 1), Dimensions::new(1, 1)),
            (Dimensions::new(16, 12), Dimensions::new(16, 10)),
            (Dimensions::new(640, 480), Dimensions::new(640, 400)),
        ] {
            let config = BridgeConfig {
                rgb,
                disparity,
                ..small_config()
            };
            let mut bridge = connected(&config);
            assert_eq!(bridge.rgb_buffer().len(), (rgb.width * rgb.height) as usize);
            assert_eq!(
                bridge.disparity_buffer().len(),
                (disparity.width * disparity.height) as usize
            );

            let rgb_addr = bridge.rgb_buffer().as_ptr();
            let disparity_addr = bridge.disparity_buffer().as_ptr();
            for _ in 0..5 {
                bridge.tick();
                assert_eq!(bridge.rgb_buffer().as_ptr(), rgb_addr);
                assert_eq!(bridge.disparity_buffer().as_ptr(), disparity_addr);
            }

            // the device was always handed the same address
            let log = bridge.device().call_log();
            assert_eq!(
                log.count(|c| *c == DeviceCall::RgbImage { addr: rgb_addr as usize }),
                5
            );
            assert_eq!(
                log.count(|c| *c
                    == DeviceCall::ColorDisparityImage {
                        addr: disparity_addr as usize
                    }),
                5
            );
        }
    }

    #[test]
    fn tick_before_connect_touches_nothing() {
        let config = small_config();
        let mut bridge = FrameBridge::with_textures(&config, SyntheticDevice::new()).unwrap();
        let rgb_before = bridge.rgb_buffer().as_bytes().to_vec();
        let disparity_before = bridge.disparity_buffer().as_bytes().to_vec();
        let generation = bridge.rgb_surface().generation();

        for _ in 0..3 {
            assert_eq!(bridge.tick(), Tick::Idle);
        }

        assert_eq!(bridge.state(), SessionState::Initialized);
        assert_eq!(bridge.rgb_buffer().as_bytes(), &rgb_before[..]);
        assert_eq!(bridge.disparity_buffer().as_bytes(), &disparity_before[..]);
        assert_eq!(bridge.rgb_surface().generation(), generation);
        assert_eq!(bridge.disparity_surface().generation(), generation);
        assert!(bridge.device().call_log().snapshot().is_empty());
    }

    #[test]
    fn full_refill_counts_up_and_uploads() {
        let config = small_config();
        let mut bridge = connected(&config);

        let mut last = None;
        for i in 0..10u64 {
            let tick = bridge.tick();
            assert_eq!(tick.refreshed_planes(), 2);
            let frame = tick.frame(Plane::Rgb).unwrap();
            if let Some(last) = last {
                assert!(frame >= last);
            }
            last = Some(frame);
            assert!(tick.frame(Plane::Disparity).is_some());
            assert_eq!(bridge.rgb_surface().generation(), i + 2);
            assert_eq!(bridge.disparity_surface().generation(), i + 2);
        }

        assert_eq!(bridge.rgb_surface().pixels(), bridge.rgb_buffer().pixels());
        assert_eq!(
            bridge.disparity_surface().pixels(),
            bridge.disparity_buffer().pixels()
        );
        assert_eq!(bridge.rgb_surface().caption(), "RGB Frame: 9");
        assert_eq!(bridge.disparity_surface().caption(), "Disparity Frame: 9");
        assert_eq!(bridge.last_frame(Plane::Rgb), Some(FrameNumber::from(9)));
    }

    #[test]
    fn frozen_counter_never_updates_surfaces() {
        let config = small_config().with_mode(OperatingMode::FrozenCounter);
        let mut bridge = FrameBridge::with_textures(&config, SyntheticDevice::new()).unwrap();
        let rgb_snapshot = bridge.rgb_surface().pixels().to_vec();
        let disparity_snapshot = bridge.disparity_surface().pixels().to_vec();
        bridge.connect(&config.storage_path).unwrap();

        for i in 1..=20 {
            assert_eq!(bridge.tick(), Tick::Counted { video_frames: i });
        }

        assert_eq!(bridge.rgb_surface().pixels(), &rgb_snapshot[..]);
        assert_eq!(bridge.disparity_surface().pixels(), &disparity_snapshot[..]);
        assert_eq!(bridge.rgb_surface().generation(), 1);
        assert_eq!(bridge.disparity_surface().generation(), 1);
        let log = bridge.device().call_log();
        assert_eq!(log.count(|c| matches!(c, DeviceCall::RgbImage { .. })), 0);
        assert_eq!(log.count(|c| *c == DeviceCall::VideoFrames), 20);
    }

    #[test]
    fn vga_footprint() {
        let config = BridgeConfig::from_profile(Profile::Vga);
        let bridge = FrameBridge::with_textures(&config, SyntheticDevice::new()).unwrap();
        assert_eq!(bridge.footprint_bytes(), 4 * (640 * 480 + 640 * 400));
        assert_eq!(bridge.footprint_bytes(), 2_252_800);
    }

    #[test]
    fn connect_failure_is_surfaced() {
        let config = small_config();
        let mut bridge =
            FrameBridge::with_textures(&config, SyntheticDevice::new().with_start_status(-5)).unwrap();
        assert!(matches!(
            bridge.connect(&config.storage_path),
            Err(BridgeError::ConnectFailed { status: -5 })
        ));
        assert_eq!(bridge.state(), SessionState::Initialized);
        assert_eq!(bridge.tick(), Tick::Idle);
    }

    #[test]
    fn connect_only_starts_once() {
        let config = small_config();
        let mut bridge = connected(&config);
        assert!(matches!(
            bridge.connect(&config.storage_path),
            Err(BridgeError::AlreadyConnected)
        ));
        assert_eq!(
            bridge.device().call_log().snapshot(),
            vec![DeviceCall::StartDeviceRecordVideo {
                rgb: Dimensions::new(16, 12),
                storage_path: "/sdcard".to_owned(),
            }]
        );
    }

    #[test]
    fn legacy_start_variant() {
        let config = small_config().with_connect(ConnectVariant::Start);
        let bridge = connected(&config);
        assert_eq!(bridge.state(), SessionState::Connected);
        assert_eq!(
            bridge.device().call_log().snapshot(),
            vec![DeviceCall::StartDevice {
                rgb: Dimensions::new(16, 12),
                storage_path: "/sdcard".to_owned(),
            }]
        );
    }

    #[test]
    fn storage_path_with_nul_is_rejected() {
        let config = small_config();
        let mut bridge = FrameBridge::with_textures(&config, SyntheticDevice::new()).unwrap();
        assert!(matches!(
            bridge.connect(Path::new("/sdcard/\0oops")),
            Err(BridgeError::InvalidStoragePath)
        ));
        assert_eq!(bridge.state(), SessionState::Initialized);
    }

    #[test]
    fn failed_refill_skips_only_that_plane() {
        let config = small_config();
        let mut bridge = connected(&config);
        bridge.device_mut().fail_next(Plane::Rgb, 1);
        let rgb_before = bridge.rgb_surface().pixels().to_vec();

        let tick = bridge.tick();
        assert!(matches!(
            tick,
            Tick::Refreshed {
                rgb: Err(RefillError::Device {
                    plane: Plane::Rgb,
                    ..
                }),
                disparity: Ok(_),
            }
        ));
        assert_eq!(tick.failed_planes(), 1);
        assert_eq!(tick.to_string(), "RGB Frame: skipped | Disparity Frame: 0");
        assert_eq!(bridge.rgb_surface().generation(), 1);
        assert_eq!(bridge.rgb_surface().pixels(), &rgb_before[..]);
        assert_eq!(bridge.disparity_surface().generation(), 2);

        let tick = bridge.tick();
        assert_eq!(tick.to_string(), "RGB Frame: 0 | Disparity Frame: 1");
        assert_eq!(bridge.rgb_surface().generation(), 2);
    }

    #[test]
    fn disconnect_and_drop_stop_the_device() {
        let config = small_config();
        let mut bridge = connected(&config);
        let log = bridge.device().call_log();

        bridge.disconnect();
        bridge.disconnect();
        assert_eq!(bridge.state(), SessionState::Initialized);
        assert_eq!(bridge.tick(), Tick::Idle);
        assert_eq!(log.count(|c| *c == DeviceCall::StopDevice), 1);

        bridge.connect(&config.storage_path).unwrap();
        drop(bridge);
        assert_eq!(log.count(|c| *c == DeviceCall::StopDevice), 2);
    }

    #[test]
    fn dropping_unconnected_bridge_does_not_stop() {
        let config = small_config();
        let bridge = FrameBridge::with_textures(&config, SyntheticDevice::new()).unwrap();
        let log = bridge.device().call_log();
        drop(bridge);
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn surface_must_match_buffer() {
        let config = small_config();
        let result = FrameBridge::initialize(&config, SyntheticDevice::new(), |plane, dims| match plane {
            Plane::Rgb => TextureSurface::new(dims),
            Plane::Disparity => TextureSurface::new(Dimensions::new(8, 8)),
        });
        match result {
            Err(BridgeError::SurfaceMismatch {
                plane,
                expected,
                actual,
            }) => {
                assert_eq!(plane, Plane::Disparity);
                assert_eq!(expected, Dimensions::new(16, 10));
                assert_eq!(actual, Dimensions::new(8, 8));
            }
            _ => panic!("expected a surface mismatch"),
        }
    }

    #[test]
    fn surfaces_start_with_buffer_contents() {
        let config = small_config();
        let bridge = FrameBridge::with_textures(&config, SyntheticDevice::new()).unwrap();
        assert!(bridge.rgb_surface().pixels().iter().all(|&p| p == Rgba32::BLACK));
        assert_eq!(bridge.rgb_surface().generation(), 1);
        assert!(bridge.rgb_surface().is_dirty());
    }
}
