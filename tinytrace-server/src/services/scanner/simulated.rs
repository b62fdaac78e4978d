use std::f64::consts::PI;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tinytrace_api::models::Rssi;
use tokio::time::Instant;

use super::Scanner;
use crate::configs::Simulation;
use crate::errors::ScanError;
use crate::services::signal_stream::Advertisement;

const TARGET_ADDRESS: &str = "5C:F3:70:00:00:01";
const NEIGHBOUR_ADDRESS: &str = "5C:F3:70:00:00:02";
const NEIGHBOUR_NAME: &str = "Headphones";

/// Tag walking away and back on a sine curve, with a neighbouring device
/// interleaved so the name filter has something to discard.
pub struct SimulatedScanner {
    target_name: String,
    simulation: Simulation,
    epoch: Instant,
    active: bool,
    emitted: u64,
}

impl SimulatedScanner {
    pub fn new(target_name: impl Into<String>, simulation: Simulation) -> Self {
        Self {
            target_name: target_name.into(),
            simulation,
            epoch: Instant::now(),
            active: false,
            emitted: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

pub fn simulated_rssi(simulation: &Simulation, elapsed: Duration) -> Rssi {
    let period = simulation.period_secs.max(1) as f64;
    let radians = elapsed.as_secs_f64() / period * 2.0 * PI;

    let jitter = if simulation.jitter > 0 {
        rand::rng().random_range(-simulation.jitter..=simulation.jitter)
    } else {
        0
    };

    let value = f64::from(simulation.base_rssi)
        + radians.sin() * f64::from(simulation.amplitude)
        + f64::from(jitter);

    value.round().clamp(-127.0, 0.0) as Rssi
}

#[async_trait]
impl Scanner for SimulatedScanner {
    async fn start(&mut self) -> Result<(), ScanError> {
        self.active = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ScanError> {
        self.active = false;
        Ok(())
    }

    async fn next_advertisement(&mut self) -> Option<Advertisement> {
        if !self.active {
            return None;
        }

        tokio::time::sleep(Duration::from_millis(self.simulation.interval_ms.max(1))).await;
        self.emitted += 1;

        if self.emitted % 4 == 0 {
            let rssi = simulated_rssi(&self.simulation, Duration::ZERO);
            return Some(Advertisement::new(NEIGHBOUR_ADDRESS, Some(NEIGHBOUR_NAME), Some(rssi)));
        }

        let rssi = simulated_rssi(&self.simulation, self.epoch.elapsed());
        Some(Advertisement::new(TARGET_ADDRESS, Some(&self.target_name), Some(rssi)))
    }
}
