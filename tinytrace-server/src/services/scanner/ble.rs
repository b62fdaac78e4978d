use std::pin::Pin;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use futures::stream::{Stream, StreamExt};

use super::Scanner;
use crate::errors::ScanError;
use crate::services::signal_stream::Advertisement;

/// Scans with the first bluetooth adapter of the host.
pub struct BleScanner {
    adapter: Adapter,
    events: Pin<Box<dyn Stream<Item = CentralEvent> + Send>>,
}

impl BleScanner {
    pub async fn new() -> Result<Self, ScanError> {
        let manager = Manager::new()
            .await
            .map_err(|e| ScanError::AdapterUnavailable(e.to_string()))?;

        let adapter = manager
            .adapters()
            .await
            .map_err(|e| ScanError::AdapterUnavailable(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| ScanError::AdapterUnavailable("no bluetooth adapter found".into()))?;

        let events = adapter
            .events()
            .await
            .map_err(|e| ScanError::AdapterUnavailable(e.to_string()))?;

        if let Ok(info) = adapter.adapter_info().await {
            tracing::info!("using bluetooth adapter {}", info);
        }

        Ok(Self { adapter, events })
    }
}

#[async_trait]
impl Scanner for BleScanner {
    async fn start(&mut self) -> Result<(), ScanError> {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| ScanError::Start(e.to_string()))
    }

    async fn stop(&mut self) -> Result<(), ScanError> {
        self.adapter
            .stop_scan()
            .await
            .map_err(|e| ScanError::Stop(e.to_string()))
    }

    async fn next_advertisement(&mut self) -> Option<Advertisement> {
        while let Some(event) = self.events.next().await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };

            let Ok(peripheral) = self.adapter.peripheral(&id).await else {
                continue;
            };
            let Ok(Some(properties)) = peripheral.properties().await else {
                continue;
            };

            return Some(Advertisement {
                address: properties.address.to_string(),
                local_name: properties.local_name,
                rssi: properties.rssi,
            });
        }

        None
    }
}
