// poller.rs - Fixed-interval refresh loop bound to a drop-to-stop handle

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What the loop does after a tick completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    Continue,
    Stop,
}

pub type TickFuture = Pin<Box<dyn Future<Output = PollDecision> + Send>>;

/// Running poll loop. Dropping the handle stops the loop; a tick that is
/// already running finishes first.
#[derive(Debug)]
pub struct PollHandle {
    stop: watch::Sender<()>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// True once the loop has exited, by request or by a `Stop` tick.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        let _ = self.stop.send(());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollScheduler {
    interval: Duration,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the loop. The first tick fires one interval from now; ticks
    /// never overlap because each one is awaited inside the loop.
    pub fn start<F>(&self, mut tick: F) -> PollHandle
    where
        F: FnMut() -> TickFuture + Send + 'static,
    {
        let period = self.interval;
        let (stop, mut stop_rx) = watch::channel(());
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!("Polling every {:?}", period);

            loop {
                tokio::select! {
                    biased;
                    // Fires on an explicit stop and when the handle is dropped.
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                if tick().await == PollDecision::Stop {
                    break;
                }
            }
            tracing::debug!("Polling stopped");
        });
        PollHandle { stop, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_millis(5000);

    fn counting(count: Arc<AtomicUsize>, stop_after: usize) -> impl FnMut() -> TickFuture + Send {
        move || {
            let count = count.clone();
            Box::pin(async move {
                if count.fetch_add(1, Ordering::SeqCst) + 1 >= stop_after {
                    PollDecision::Stop
                } else {
                    PollDecision::Continue
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_each_interval_until_stop_decision() {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = PollScheduler::new(PERIOD).start(counting(count.clone(), 3));

        sleep(Duration::from_millis(4_900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = PollScheduler::new(PERIOD).start(counting(count.clone(), usize::MAX));

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        drop(handle);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_running_tick_finish() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let (s, f) = (started.clone(), finished.clone());
        let handle = PollScheduler::new(PERIOD).start(move || {
            let (s, f) = (s.clone(), f.clone());
            Box::pin(async move {
                s.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(1_000)).await;
                f.fetch_add(1, Ordering::SeqCst);
                PollDecision::Continue
            })
        });

        sleep(Duration::from_millis(5_500)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        handle.stop();

        sleep(Duration::from_secs(60)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
