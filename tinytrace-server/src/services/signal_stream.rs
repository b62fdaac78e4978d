use tinytrace_api::models::{Rssi, SignalSample};

/// One advertisement as reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: String,
    pub local_name: Option<String>,
    pub rssi: Option<Rssi>,
}

impl Advertisement {
    pub fn new(address: impl Into<String>, local_name: Option<&str>, rssi: Option<Rssi>) -> Self {
        Self {
            address: address.into(),
            local_name: local_name.map(str::to_string),
            rssi,
        }
    }
}

pub type Observer = Box<dyn FnMut(&SignalSample) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle(usize);

/// Filters advertisements down to the tracked tag and fans its samples out to
/// every observer, in subscription order.
pub struct SignalStream {
    target_name: String,
    latest_rssi: Option<Rssi>,
    observers: Vec<Observer>,
}

impl SignalStream {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            latest_rssi: None,
            observers: Vec::new(),
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn latest_rssi(&self) -> Option<Rssi> {
        self.latest_rssi
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn subscribe<F>(&mut self, observer: F) -> ObserverHandle
    where
        F: FnMut(&SignalSample) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
        ObserverHandle(self.observers.len() - 1)
    }

    pub fn matches(&self, advertisement: &Advertisement) -> bool {
        advertisement
            .local_name
            .as_deref()
            .is_some_and(|name| name.contains(self.target_name.as_str()))
    }

    /// Returns the sample delivered to observers, or `None` when the
    /// advertisement was discarded.
    pub fn ingest(&mut self, advertisement: &Advertisement) -> Option<SignalSample> {
        if !self.matches(advertisement) {
            return None;
        }
        let rssi = advertisement.rssi?;
        let name = advertisement.local_name.as_deref().unwrap_or_default();

        let sample = SignalSample::new(name, rssi);
        tracing::debug!("{} ({}) RSSI: {} dBm", name, advertisement.address, rssi);

        self.latest_rssi = Some(rssi);
        for observer in self.observers.iter_mut() {
            observer(&sample);
        }

        Some(sample)
    }
}
