use std::time::Duration;

use tinytrace_api::Shutdown;

use crate::services::monitor_service::MonitorPublisher;
use crate::services::scanner::Scanner;
use crate::services::signal_stream::SignalStream;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Cycles in which scanning was started
    pub cycles: u64,
    /// Start or stop failures
    pub faults: u64,
    /// Advertisements forwarded to observers
    pub samples: u64,
}

enum HoldEnd {
    Elapsed,
    Shutdown,
}

/// Keeps the radio scanning in bounded windows: start, hold for
/// `scan_period`, stop, repeat. Radio failures are published as a monitor
/// fault and retried after `retry_delay`; only shutdown ends the loop.
pub struct ScanCycleController {
    scanner: Box<dyn Scanner>,
    stream: SignalStream,
    publisher: MonitorPublisher,
    scan_period: Duration,
    retry_delay: Duration,
    summary: ScanSummary,
    /// Set from a successful start until a stop succeeds
    radio_active: bool,
}

impl ScanCycleController {
    pub fn new(
        scanner: Box<dyn Scanner>,
        stream: SignalStream,
        publisher: MonitorPublisher,
        scan_period: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            scanner,
            stream,
            publisher,
            scan_period,
            retry_delay,
            summary: ScanSummary::default(),
            radio_active: false,
        }
    }

    pub async fn run(mut self, shutdown: Shutdown) -> ScanSummary {
        tracing::info!(
            target_name = self.stream.target_name(),
            period = ?self.scan_period,
            "scan loop started"
        );

        while !shutdown.is_triggered() {
            // A radio left scanning by a failed stop must be stopped before it
            // will accept another start
            if self.radio_active && !self.stop_scanning().await {
                if !shutdown.sleep(self.retry_delay).await {
                    break;
                }
                continue;
            }

            if let Err(e) = self.scanner.start().await {
                tracing::warn!("{}, retrying in {:?}", e, self.retry_delay);
                self.fault(e.to_string());
                if !shutdown.sleep(self.retry_delay).await {
                    break;
                }
                continue;
            }

            self.radio_active = true;
            self.summary.cycles += 1;
            self.publisher.publish_enabled();
            tracing::debug!(cycle = self.summary.cycles, "scanning");

            let end = self.hold(&shutdown).await;
            let stopped = self.stop_scanning().await;

            if matches!(end, HoldEnd::Shutdown) {
                break;
            }
            if !stopped && !shutdown.sleep(self.retry_delay).await {
                break;
            }
        }

        if self.radio_active {
            if let Err(e) = self.scanner.stop().await {
                tracing::warn!("radio left scanning at shutdown: {}", e);
            }
        }

        tracing::info!(
            cycles = self.summary.cycles,
            faults = self.summary.faults,
            "scan loop stopped"
        );
        self.summary
    }

    /// Stops the radio, publishing a fault when it refuses.
    async fn stop_scanning(&mut self) -> bool {
        match self.scanner.stop().await {
            Ok(()) => {
                self.radio_active = false;
                true
            }
            Err(e) => {
                tracing::warn!("{}, retrying in {:?}", e, self.retry_delay);
                self.fault(e.to_string());
                false
            }
        }
    }

    fn fault(&mut self, cause: String) {
        self.summary.faults += 1;
        self.publisher.publish_fault(cause);
    }

    async fn hold(&mut self, shutdown: &Shutdown) -> HoldEnd {
        let deadline = tokio::time::sleep(self.scan_period);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return HoldEnd::Elapsed,
                _ = shutdown.triggered() => return HoldEnd::Shutdown,
                advertisement = self.scanner.next_advertisement() => match advertisement {
                    Some(advertisement) => {
                        if self.stream.ingest(&advertisement).is_some() {
                            self.summary.samples += 1;
                        }
                    }
                    // Source went quiet; sit out the rest of the window
                    None => {
                        tokio::select! {
                            _ = &mut deadline => return HoldEnd::Elapsed,
                            _ = shutdown.triggered() => return HoldEnd::Shutdown,
                        }
                    }
                },
            }
        }
    }
}
