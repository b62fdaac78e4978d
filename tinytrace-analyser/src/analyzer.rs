use crate::window::SlidingWindow;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Window size must be at least one sample")]
    EmptyWindow,
}

/// Outcome of a single classification. `Warning` is an expected result, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Safe,
    Warning,
}

impl Classification {
    pub fn is_warning(&self) -> bool {
        matches!(self, Classification::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Analysis {
    pub classification: Classification,
    pub latest: i16,
    pub average: f64,
    pub window_len: usize,
}

/// Smooths a stream of RSSI samples and classifies the wearer's proximity.
///
/// Every call re-evaluates from the window alone: there is no hysteresis, so a
/// single low sample can flip the result to `Warning` and a single recovering
/// sample flips it back.
#[derive(Debug, Clone)]
pub struct ProximityAnalyzer {
    threshold: i16,
    window: SlidingWindow,
}

impl ProximityAnalyzer {
    pub fn new(threshold: i16, capacity: usize) -> Result<Self, AnalyzerError> {
        if capacity == 0 {
            return Err(AnalyzerError::EmptyWindow);
        }

        Ok(Self {
            threshold,
            window: SlidingWindow::new(capacity),
        })
    }

    pub fn analyze(&mut self, rssi: i16) -> Analysis {
        self.window.push(rssi);

        // A non-empty window always has an average; the fallback is unreachable.
        let average = self.window.average().unwrap_or(f64::from(rssi));

        let classification = if average < f64::from(self.threshold) {
            Classification::Warning
        } else {
            Classification::Safe
        };

        Analysis {
            classification,
            latest: rssi,
            average,
            window_len: self.window.len(),
        }
    }

    pub fn threshold(&self) -> i16 {
        self.threshold
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn average(&self) -> Option<f64> {
        self.window.average()
    }

    pub fn history(&self) -> impl Iterator<Item = i16> + '_ {
        self.window.iter()
    }
}
