use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::ClientError;

pub const POLL_PERIOD: Duration = Duration::from_secs(5);

type Fetch<T> = Arc<dyn Fn(Option<i64>) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

/// What a panel currently shows.
#[derive(Debug, Clone)]
pub struct PanelSnapshot<T> {
    pub data: Option<T>,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
}

impl<T> Default for PanelSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            last_error: None,
            last_updated: None,
        }
    }
}

/// Keeps one panel fresh: an immediate fetch and then one every period, but only while the
/// panel is visible and, for targeted panels, has a target. There is never more than one
/// schedule; every change cancels the old one before starting the next.
pub struct PollManager<T> {
    name: &'static str,
    needs_target: bool,
    period: Duration,
    fetch: Fetch<T>,
    visible: bool,
    target: Option<i64>,
    schedule: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    snapshot: Arc<Mutex<PanelSnapshot<T>>>,
}

impl<T: Send + 'static> PollManager<T> {
    /// A panel that polls as soon as it is visible.
    pub fn global<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self::build(name, false, move |_| fetch())
    }

    /// A panel that polls only once a target is selected, and always against that target.
    pub fn targeted<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn(i64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self::build(name, true, move |target| match target {
            Some(id) => fetch(id).boxed(),
            None => async { Err(ClientError::Validation("No target selected".to_string())) }.boxed(),
        })
    }

    fn build<F, Fut>(name: &'static str, needs_target: bool, fetch: F) -> Self
    where
        F: Fn(Option<i64>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            name,
            needs_target,
            period: POLL_PERIOD,
            fetch: Arc::new(move |target| fetch(target).boxed()),
            visible: false,
            target: None,
            schedule: None,
            generation: Arc::new(AtomicU64::new(0)),
            snapshot: Arc::new(Mutex::new(PanelSnapshot::default())),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn target(&self) -> Option<i64> {
        self.target
    }

    /// Whether a recurring fetch is currently scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.schedule.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        self.reschedule();
    }

    pub fn toggle(&mut self) -> bool {
        self.set_visible(!self.visible);
        self.visible
    }

    /// Points the panel at a new target. Whatever was shown for the old one is dropped.
    pub fn set_target(&mut self, target: Option<i64>) {
        if self.target == target {
            return;
        }
        self.target = target;
        *self.snapshot_mut() = PanelSnapshot::default();
        self.reschedule();
    }

    /// Stops polling for good. Called when the hosting screen goes away.
    pub fn teardown(&mut self) {
        self.visible = false;
        self.cancel();
    }

    fn cancel(&mut self) {
        // Anything still in flight for the old schedule is discarded when it lands.
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(handle) = self.schedule.take() {
            handle.abort();
            log::debug!("{} polling stopped", self.name);
        }
    }

    fn reschedule(&mut self) {
        self.cancel();
        if !self.visible || (self.needs_target && self.target.is_none()) {
            return;
        }

        let generation = self.generation.load(Ordering::Acquire);
        let current = Arc::clone(&self.generation);
        let snapshot = Arc::clone(&self.snapshot);
        let fetch = Arc::clone(&self.fetch);
        let target = self.target;
        let period = self.period;
        let name = self.name;

        log::debug!("{} polling every {:?} (target {:?})", name, period, target);
        self.schedule = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = fetch(target).await;
                if current.load(Ordering::Acquire) != generation {
                    log::debug!("{} discarded a superseded response", name);
                    return;
                }
                let mut shown = snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                match result {
                    Ok(data) => {
                        shown.data = Some(data);
                        shown.last_error = None;
                        shown.last_updated = Some(Local::now());
                    }
                    Err(e) => {
                        log::warn!("{} refresh failed: {}", name, e);
                        shown.last_error = Some(e.user_message("Refresh failed"));
                    }
                }
            }
        }));
    }

    fn snapshot_mut(&self) -> MutexGuard<'_, PanelSnapshot<T>> {
        self.snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone + Send + 'static> PollManager<T> {
    pub fn snapshot(&self) -> PanelSnapshot<T> {
        self.snapshot_mut().clone()
    }
}

impl<T> Drop for PollManager<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.schedule.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<Option<i64>>>>);

    impl Calls {
        fn record(&self, target: Option<i64>) {
            self.0.lock().unwrap().push(target);
        }

        fn all(&self) -> Vec<Option<i64>> {
            self.0.lock().unwrap().clone()
        }

        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    fn counting_global(calls: &Calls) -> PollManager<usize> {
        let calls = calls.clone();
        PollManager::global("otps", move || {
            let calls = calls.clone();
            async move {
                calls.record(None);
                Ok(calls.count())
            }
        })
    }

    fn counting_targeted(calls: &Calls) -> PollManager<i64> {
        let calls = calls.clone();
        PollManager::targeted("stats", move |id| {
            let calls = calls.clone();
            async move {
                calls.record(Some(id));
                Ok(id)
            }
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn visible_panel_fetches_now_and_every_period() {
        let calls = Calls::default();
        let mut panel = counting_global(&calls);

        panel.set_visible(true);
        settle().await;
        assert_eq!(calls.count(), 1);
        assert!(panel.is_scheduled());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.count(), 3);
        assert_eq!(panel.snapshot().data, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn hiding_stops_fetching() {
        let calls = Calls::default();
        let mut panel = counting_global(&calls);

        panel.set_visible(true);
        settle().await;
        panel.set_visible(false);
        assert!(!panel.is_scheduled());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_double_toggle_leaves_no_schedule() {
        let calls = Calls::default();
        let mut panel = counting_global(&calls);

        panel.toggle();
        panel.toggle();
        panel.toggle();
        panel.toggle();
        assert!(!panel.is_visible());
        assert!(!panel.is_scheduled());

        let before = calls.count();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.count(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn targeted_panel_waits_for_a_target() {
        let calls = Calls::default();
        let mut panel = counting_targeted(&calls);

        panel.set_visible(true);
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(calls.count(), 0);
        assert!(!panel.is_scheduled());

        panel.set_target(Some(9));
        settle().await;
        assert_eq!(calls.all(), vec![Some(9)]);
    }

    #[tokio::test(start_paused = true)]
    async fn target_change_fetches_once_and_keeps_one_schedule() {
        let calls = Calls::default();
        let mut panel = counting_targeted(&calls);
        panel.set_visible(true);
        panel.set_target(Some(1));
        settle().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.all(), vec![Some(1), Some(1)]);

        panel.set_target(Some(2));
        assert_eq!(panel.snapshot().data, None);
        settle().await;
        assert_eq!(calls.all(), vec![Some(1), Some(1), Some(2)]);
        assert_eq!(panel.snapshot().data, Some(2));

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(calls.count(), 3);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.all(), vec![Some(1), Some(1), Some(2), Some(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_recorded_and_polling_continues() {
        let calls = Calls::default();
        let counter = calls.clone();
        let mut panel = PollManager::global("results", move || {
            let calls = counter.clone();
            async move {
                calls.record(None);
                if calls.count() == 1 {
                    Err(ClientError::Transient("connection reset".into()))
                } else {
                    Ok("fresh")
                }
            }
        });

        panel.set_visible(true);
        settle().await;
        let shown = panel.snapshot();
        assert_eq!(shown.data, None);
        assert_eq!(shown.last_error.as_deref(), Some("Refresh failed"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        let shown = panel.snapshot();
        assert_eq!(shown.data, Some("fresh"));
        assert_eq!(shown.last_error, None);
        assert!(shown.last_updated.is_some());
        assert!(panel.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_for_an_old_target_is_never_shown() {
        let mut panel = PollManager::targeted("results", |id| async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(id)
        });
        panel.set_visible(true);
        panel.set_target(Some(1));
        tokio::time::sleep(Duration::from_millis(500)).await;

        panel.set_target(Some(2));
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(panel.snapshot().data, None);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(panel.snapshot().data, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_and_drop_cancel_the_schedule() {
        let calls = Calls::default();
        let mut panel = counting_global(&calls);
        panel.set_visible(true);
        settle().await;

        panel.teardown();
        assert!(!panel.is_scheduled());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.count(), 1);

        let mut dropped = counting_global(&calls);
        dropped.set_visible(true);
        settle().await;
        drop(dropped);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.count(), 2);
    }
}
