use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

/// Periodic trigger of the flush cycle, driven by a spawned Tokio task.
///
/// [`FlushScheduler::start`] replaces any running task, [`FlushScheduler::stop`] is a no-op when
/// nothing is running. Dropping the scheduler stops its task.
#[derive(Debug, Default)]
pub struct FlushScheduler {
    task: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    /// Start invoking `on_tick` every `period`, the first invocation one `period` from now.
    ///
    /// The task ends when `on_tick` returns `false`. Must be called from within a Tokio runtime.
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.stop();

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if !on_tick() {
                    debug!("flush scheduler target dropped, stopping");
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn counting() -> (Arc<AtomicUsize>, impl FnMut() -> bool + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        (count, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_scheduler_ticks_until_stopped() {
        let mut scheduler = FlushScheduler::default();
        assert!(!scheduler.is_running());

        let (count, on_tick) = counting();
        scheduler.start(Duration::from_millis(100), on_tick);
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        scheduler.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_running());

        // Stopping again is a no-op
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_scheduler_restart_replaces_task() {
        let mut scheduler = FlushScheduler::default();

        let (first, on_tick) = counting();
        scheduler.start(Duration::from_millis(100), on_tick);
        let (second, on_tick) = counting();
        scheduler.start(Duration::from_millis(100), on_tick);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_scheduler_ends_when_tick_returns_false() {
        let mut scheduler = FlushScheduler::default();
        scheduler.start(Duration::from_millis(10), || false);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!scheduler.is_running());
    }
}
