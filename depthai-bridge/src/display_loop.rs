//! Fixed-rate driver that ticks a bridge once per display frame, for hosts
//! without their own per-frame callback.
//!
//! The loop runs on the calling task and borrows the bridge mutably, so the
//! bridge and its device need not be `Send`. A tick that blocks in the
//! device blocks the loop.

use std::time::Duration;

use tokio::{
    sync::watch,
    time::{self, Interval, MissedTickBehavior},
};

use crate::{
    bridge::{FrameBridge, Tick},
    device::DeviceApi,
    surface::DisplaySurface,
};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub idle: u64,
    pub refreshed_planes: u64,
    pub failed_planes: u64,
    pub counted: u64,
}
impl LoopStats {
    fn record(&mut self, tick: &Tick) {
        self.ticks += 1;
        match tick {
            Tick::Idle => self.idle += 1,
            Tick::Refreshed { .. } => {
                self.refreshed_planes += tick.refreshed_planes() as u64;
                self.failed_planes += tick.failed_planes() as u64;
            }
            Tick::Counted { .. } => self.counted += 1,
        }
    }
}

pub struct DisplayLoop {
    period: Duration,
}

impl DisplayLoop {
    /// A loop ticking `fps` times per second. Zero is treated as one.
    pub fn new(fps: u32) -> Self {
        DisplayLoop {
            period: (Duration::from_secs(1) / fps.max(1)).max(Duration::from_nanos(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn interval(&self) -> Interval {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }

    /// Tick until `shutdown` turns true or its sender goes away.
    pub async fn run<D: DeviceApi, S: DisplaySurface>(
        &self,
        bridge: &mut FrameBridge<D, S>,
        mut shutdown: watch::Receiver<bool>,
    ) -> LoopStats {
        let mut stats = LoopStats::default();
        if *shutdown.borrow() {
            return stats;
        }
        let mut interval = self.interval();
        log::debug!("display loop started ({:?} per frame)", self.period);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let tick = bridge.tick();
                    log::trace!("{}", tick);
                    stats.record(&tick);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::debug!("display loop stopped after {} ticks", stats.ticks);
        stats
    }

    /// Tick exactly `frames` times at the loop's rate.
    pub async fn run_for<D: DeviceApi, S: DisplaySurface>(
        &self,
        bridge: &mut FrameBridge<D, S>,
        frames: u64,
    ) -> LoopStats {
        let mut stats = LoopStats::default();
        let mut interval = self.interval();
        for _ in 0..frames {
            interval.tick().await;
            let tick = bridge.tick();
            log::trace!("{}", tick);
            stats.record(&tick);
        }
        stats
    }
}
