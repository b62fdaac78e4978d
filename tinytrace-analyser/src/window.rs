use std::collections::VecDeque;

/// Fixed-capacity FIFO of signal samples with a running sum.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    buffer: VecDeque<i16>,
    total: i64,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity + 1),
            total: 0,
            capacity,
        }
    }

    /// Appends `input` and evicts the oldest sample once the window overflows.
    pub fn push(&mut self, input: i16) -> Option<i16> {
        self.buffer.push_back(input);
        self.total += i64::from(input);

        if self.buffer.len() > self.capacity {
            let evicted = self.buffer.pop_front()?;
            self.total -= i64::from(evicted);
            return Some(evicted);
        }

        None
    }

    /// Mean of the samples currently held; partial windows are not padded.
    pub fn average(&self) -> Option<f64> {
        if self.buffer.is_empty() {
            return None;
        }

        Some(self.total as f64 / self.buffer.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<i16> {
        self.buffer.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = i16> + '_ {
        self.buffer.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut window = SlidingWindow::new(4);

        for (n, sample) in [-60, -61, -62, -63, -64, -65, -66].into_iter().enumerate() {
            window.push(sample);
            assert_eq!(window.len(), (n + 1).min(4));
        }
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut window = SlidingWindow::new(2);

        assert_eq!(window.push(-50), None);
        assert_eq!(window.push(-55), None);
        assert_eq!(window.push(-70), Some(-50));
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![-55, -70]);
    }

    #[test]
    fn test_partial_window_average_is_not_padded() {
        let mut window = SlidingWindow::new(10);
        window.push(-70);
        window.push(-80);

        assert_eq!(window.average(), Some(-75.0));
    }

    #[test]
    fn test_running_sum_matches_contents_after_many_evictions() {
        let mut window = SlidingWindow::new(3);

        for sample in (0..500).map(|i| -40 - (i % 57) as i16) {
            window.push(sample);
            let expected = window.iter().map(f64::from).sum::<f64>() / window.len() as f64;
            assert!((window.average().unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_window_has_no_average() {
        let window = SlidingWindow::new(3);

        assert!(window.is_empty());
        assert_eq!(window.average(), None);
        assert_eq!(window.latest(), None);
    }
}
