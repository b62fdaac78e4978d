use std::time::Duration;

use tokio::sync::watch;

/// Sending half of the process-wide stop signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

/// Observed at every suspension point of long-running tasks.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: Option<watch::Receiver<bool>>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = watch::channel(false);

    (
        ShutdownTrigger { sender },
        Shutdown {
            receiver: Some(receiver),
        },
    )
}

impl Shutdown {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { receiver: None }
    }

    pub fn is_triggered(&self) -> bool {
        self.receiver
            .as_ref()
            .map(|receiver| *receiver.borrow())
            .unwrap_or(false)
    }

    /// Resolves once the trigger fires. A dropped trigger never resolves.
    pub async fn triggered(&self) {
        if let Some(receiver) = &self.receiver {
            let mut receiver = receiver.clone();
            if receiver.wait_for(|stopped| *stopped).await.is_ok() {
                return;
            }
        }

        std::future::pending::<()>().await
    }

    /// Sleeps for `duration`; returns `false` if the shutdown fired first.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_trigger() {
        let (trigger, shutdown) = shutdown_channel();

        let sleeper = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { shutdown.sleep(Duration::from_secs(60)).await }
        });
        tokio::task::yield_now().await;
        trigger.trigger();

        assert!(!sleeper.await.unwrap());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_completes_sleep() {
        let shutdown = Shutdown::never();

        assert!(shutdown.sleep(Duration::from_secs(5)).await);
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trigger_does_not_stop() {
        let (trigger, shutdown) = shutdown_channel();
        drop(trigger);

        assert!(shutdown.sleep(Duration::from_secs(1)).await);
    }
}
