// idle.rs - Inactivity timeout that returns the host to the landing route

use crate::host::Navigator;
use crate::stores::lock;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

pub const LANDING_ROUTE: &str = "/";

/// User input that counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    PointerMove,
    KeyPress,
    Click,
    TouchStart,
}

#[derive(Debug)]
struct IdleTimer {
    activity: mpsc::UnboundedSender<Activity>,
    task: JoinHandle<()>,
}

/// Disarmed until `arm`; then one timer, reset by every recorded activity,
/// navigates to [`LANDING_ROUTE`] when it runs out.
pub struct IdleTimeout {
    timeout: Duration,
    navigator: Arc<dyn Navigator>,
    timer: Mutex<Option<IdleTimer>>,
}

impl IdleTimeout {
    pub fn new(timeout: Duration, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            timeout,
            navigator,
            timer: Mutex::new(None),
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.timer)
            .as_ref()
            .is_some_and(|timer| !timer.task.is_finished())
    }

    /// Start the timer. Arming an armed controller does nothing.
    pub fn arm(&self) {
        let mut slot = lock(&self.timer);
        if slot.as_ref().is_some_and(|timer| !timer.task.is_finished()) {
            return;
        }

        let (activity, mut activity_rx) = mpsc::unbounded_channel();
        let timeout = self.timeout;
        let navigator = self.navigator.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    received = activity_rx.recv() => match received {
                        Some(activity) => {
                            tracing::trace!("Idle timer reset by {:?}", activity);
                        }
                        None => return,
                    },
                    _ = sleep(timeout) => {
                        tracing::info!("No activity for {:?}, returning to {}", timeout, LANDING_ROUTE);
                        navigator.navigate(LANDING_ROUTE);
                        return;
                    }
                }
            }
        });

        tracing::info!("Idle timeout armed ({:?})", timeout);
        *slot = Some(IdleTimer { activity, task });
    }

    /// Reset the timer. Ignored while disarmed.
    pub fn record(&self, activity: Activity) {
        if let Some(timer) = lock(&self.timer).as_ref() {
            let _ = timer.activity.send(activity);
        }
    }

    /// Drop the timer whatever the state.
    pub fn shutdown(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.task.abort();
        }
    }
}

impl Drop for IdleTimeout {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Routes(std::sync::Mutex<Vec<String>>);

    impl Navigator for Routes {
        fn navigate(&self, route: &str) {
            self.0.lock().unwrap().push(route.to_string());
        }
    }

    impl Routes {
        fn visited(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(180_000);

    #[tokio::test(start_paused = true)]
    async fn disarmed_never_navigates() {
        let routes = Arc::new(Routes::default());
        let idle = IdleTimeout::new(TIMEOUT, routes.clone());

        idle.record(Activity::Click);
        sleep(TIMEOUT * 2).await;
        assert!(!idle.is_armed());
        assert!(routes.visited().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_navigates_to_landing_once() {
        let routes = Arc::new(Routes::default());
        let idle = IdleTimeout::new(TIMEOUT, routes.clone());
        idle.arm();
        assert!(idle.is_armed());

        sleep(TIMEOUT - Duration::from_millis(1)).await;
        assert!(routes.visited().is_empty());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(routes.visited(), vec![LANDING_ROUTE.to_string()]);

        sleep(TIMEOUT * 2).await;
        assert_eq!(routes.visited().len(), 1);
        assert!(!idle.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_timer() {
        let routes = Arc::new(Routes::default());
        let idle = IdleTimeout::new(TIMEOUT, routes.clone());
        idle.arm();

        for activity in [Activity::PointerMove, Activity::KeyPress, Activity::TouchStart] {
            sleep(TIMEOUT - Duration::from_secs(1)).await;
            idle.record(activity);
        }
        assert!(routes.visited().is_empty());

        sleep(TIMEOUT + Duration::from_millis(1)).await;
        assert_eq!(routes.visited().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn arming_twice_keeps_one_timer() {
        let routes = Arc::new(Routes::default());
        let idle = IdleTimeout::new(TIMEOUT, routes.clone());
        idle.arm();
        sleep(TIMEOUT / 2).await;
        idle.arm();

        sleep(TIMEOUT / 2 + Duration::from_millis(1)).await;
        assert_eq!(routes.visited().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_pending_timer() {
        let routes = Arc::new(Routes::default());
        let idle = IdleTimeout::new(TIMEOUT, routes.clone());
        idle.arm();
        idle.shutdown();

        sleep(TIMEOUT * 2).await;
        assert!(routes.visited().is_empty());
        assert!(!idle.is_armed());
    }
}
