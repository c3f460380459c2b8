//! Live RGB and disparity preview from a DepthAI device through the native
//! `depthai_android_api` library.
//!
//! A [`FrameBridge`] owns two pinned RGBA buffers, hands their addresses to a
//! [`DeviceApi`] to refill in place, and mirrors them onto display surfaces
//! once per display frame.

pub mod bridge;
pub mod config;
pub mod device;
pub mod display_loop;
pub mod error;
pub mod native;
pub mod pixel_buffer;
pub mod surface;
pub mod synthetic;
pub mod types;

pub use bridge::{FrameBridge, PlaneUpdate, SessionState, Tick};
pub use config::BridgeConfig;
pub use device::DeviceApi;
pub use display_loop::{DisplayLoop, LoopStats};
pub use error::{BridgeError, ConfigError, RefillError};
#[cfg(feature = "native")]
pub use native::NativeDevice;
pub use pixel_buffer::PixelBuffer;
pub use surface::{DisplaySurface, TextureSurface};
pub use synthetic::SyntheticDevice;
pub use types::{ConnectVariant, Dimensions, FrameNumber, OperatingMode, Plane, Profile, Rgba32};
