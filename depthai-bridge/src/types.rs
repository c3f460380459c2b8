//! Plain value types shared by the bridge, its devices and its surfaces.

use std::{convert::TryFrom, fmt, str::FromStr};

use bytemuck::{Pod, Zeroable};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// One 32-bit pixel, laid out the way the native library writes it.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
impl Rgba32 {
    pub const BLACK: Rgba32 = Rgba32::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba32 { r, g, b, a }
    }
}

/// Size of one image plane in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}
impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Dimensions { width, height }
    }

    /// `None` if either side is zero or the byte size of a plane this large
    /// cannot be addressed.
    pub fn pixel_count(&self) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let count = (self.width as usize).checked_mul(self.height as usize)?;
        let bytes = count.checked_mul(std::mem::size_of::<Rgba32>())?;
        if bytes > isize::MAX as usize {
            return None;
        }
        Some(count)
    }

    pub fn byte_len(&self) -> Option<usize> {
        self.pixel_count()
            .map(|count| count * std::mem::size_of::<Rgba32>())
    }
}
impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    Rgb,
    Disparity,
}
impl Plane {
    pub const ALL: [Plane; 2] = [Plane::Rgb, Plane::Disparity];

    pub fn display_name(&self) -> &'static str {
        match self {
            Plane::Rgb => "RGB",
            Plane::Disparity => "Disparity",
        }
    }
}
impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
impl FromStr for Plane {
    type Err = ();
    fn from_str(input: &str) -> Result<Plane, Self::Err> {
        match input {
            "rgb" => Ok(Plane::Rgb),
            "disparity" => Ok(Plane::Disparity),
            _ => Err(()),
        }
    }
}

/// Sequence number the device attaches to each refilled image.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, From, Into, Display,
)]
pub struct FrameNumber(u32);

/// Selects what a tick does once the device is connected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Refill both planes and upload them to their surfaces every tick.
    FullRefill,
    /// Only poll the video frame counter. Surfaces keep the pixels captured
    /// at initialization.
    FrozenCounter,
}
impl Default for OperatingMode {
    fn default() -> Self {
        OperatingMode::FullRefill
    }
}
impl FromStr for OperatingMode {
    type Err = ();
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "full_refill" => Ok(OperatingMode::FullRefill),
            "frozen_counter" => Ok(OperatingMode::FrozenCounter),
            _ => Err(()),
        }
    }
}

/// Which native start entry point `connect` uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectVariant {
    /// Legacy preview-only start. Reports no status.
    Start,
    /// Start with on-device video recording. Reports an integer status.
    StartWithRecording,
}
impl Default for ConnectVariant {
    fn default() -> Self {
        ConnectVariant::StartWithRecording
    }
}
impl FromStr for ConnectVariant {
    type Err = ();
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "start" => Ok(ConnectVariant::Start),
            "start_with_recording" => Ok(ConnectVariant::StartWithRecording),
            _ => Err(()),
        }
    }
}

/// Resolution presets for the two supported build variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// 640x480 RGB, 640x400 disparity.
    Vga,
    /// 1920x1080 RGB, 1280x720 disparity.
    FullHd,
}
impl Profile {
    pub fn rgb(&self) -> Dimensions {
        match self {
            Profile::Vga => Dimensions::new(640, 480),
            Profile::FullHd => Dimensions::new(1920, 1080),
        }
    }

    pub fn disparity(&self) -> Dimensions {
        match self {
            Profile::Vga => Dimensions::new(640, 400),
            Profile::FullHd => Dimensions::new(1280, 720),
        }
    }
}
impl Default for Profile {
    fn default() -> Self {
        Profile::FullHd
    }
}
impl FromStr for Profile {
    type Err = ();
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "vga" => Ok(Profile::Vga),
            "full_hd" => Ok(Profile::FullHd),
            _ => Err(()),
        }
    }
}

impl TryFrom<(u32, u32)> for Dimensions {
    type Error = ();
    fn try_from((width, height): (u32, u32)) -> Result<Self, Self::Error> {
        let dims = Dimensions::new(width, height);
        dims.pixel_count().map(|_| dims).ok_or(())
    }
}
