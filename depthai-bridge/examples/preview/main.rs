use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tokio::sync::watch;

use depthai_bridge::{
    BridgeConfig, DeviceApi, DisplayLoop, DisplaySurface, FrameBridge, OperatingMode, Plane, Profile,
    SyntheticDevice, TextureSurface,
};

#[derive(Parser)]
pub struct Opts {
    /// JSON bridge config. Overrides --profile and --mode.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Resolution preset (vga, full_hd).
    #[clap(long, default_value = "vga")]
    pub profile: String,
    /// Operating mode (full_refill, frozen_counter).
    #[clap(long, default_value = "full_refill")]
    pub mode: String,
    /// Display frames per second.
    #[clap(long, default_value_t = 30)]
    pub fps: u32,
    /// Stop after this many frames instead of after --seconds.
    #[clap(long)]
    pub frames: Option<u64>,
    #[clap(long, default_value_t = 3)]
    pub seconds: u64,
    /// Use the attached device instead of the synthetic one.
    #[cfg(feature = "native")]
    #[clap(long)]
    pub native: bool,
}

fn device(opts: &Opts) -> Box<dyn DeviceApi> {
    #[cfg(feature = "native")]
    {
        if opts.native {
            return Box::new(depthai_bridge::NativeDevice::new());
        }
    }
    let _ = opts;
    Box::new(SyntheticDevice::new())
}

fn mean(surface: &TextureSurface) -> [u64; 3] {
    let n = surface.pixels().len().max(1) as u64;
    let mut sum = [0u64; 3];
    for p in surface.pixels() {
        sum[0] += p.r as u64;
        sum[1] += p.g as u64;
        sum[2] += p.b as u64;
    }
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let opts: Opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => BridgeConfig::from_path(path)?,
        None => {
            let profile: Profile = opts
                .profile
                .parse()
                .map_err(|_| format!("unknown profile {:?}", opts.profile))?;
            let mode: OperatingMode = opts
                .mode
                .parse()
                .map_err(|_| format!("unknown mode {:?}", opts.mode))?;
            BridgeConfig::from_profile(profile).with_mode(mode)
        }
    };
    println!("{}", config.to_json_string()?);

    let mut bridge = FrameBridge::with_textures(&config, device(&opts))?;
    bridge.connect(&config.storage_path)?;

    let display_loop = DisplayLoop::new(opts.fps);
    let stats = match opts.frames {
        Some(frames) => display_loop.run_for(&mut bridge, frames).await,
        None => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let seconds = opts.seconds;
            let (stats, _) = tokio::join!(display_loop.run(&mut bridge, shutdown_rx), async move {
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                let _ = shutdown_tx.send(true);
            });
            stats
        }
    };

    println!("{:?}", stats);
    for &plane in &Plane::ALL {
        let surface = match plane {
            Plane::Rgb => bridge.rgb_surface(),
            Plane::Disparity => bridge.disparity_surface(),
        };
        println!(
            "{}: {} uploads={} caption={:?} mean={:?}",
            plane,
            surface.dimensions(),
            surface.generation(),
            surface.caption(),
            mean(surface)
        );
    }

    bridge.disconnect();
    Ok(())
}
