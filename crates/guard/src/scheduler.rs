//! Keyed recurring task scheduler
//!
//! One tokio task per key:
//!
//! ```text
//!  {inactive} ──schedule──► {polling} ──cancel──► {inactive}
//! ```
//!
//! Cancellation only stops future ticks. A tick already running when its
//! key is cancelled runs to completion. Dropping the scheduler cancels
//! every key.

use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shutdown handles of the running tasks; dropping a sender stops its task
#[derive(Default)]
pub struct PollingScheduler {
    tasks: Mutex<HashMap<String, oneshot::Sender<()>>>,
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` every `period`, first tick one period from now
    ///
    /// Returns `false` without scheduling anything if `key` already has a
    /// task. Must be called inside a tokio runtime.
    pub fn schedule<F, Fut>(&self, key: &str, period: Duration, task: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(key) {
            return false;
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();
        let task_key = key.to_string();

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {}
                }

                // Outside the select: cancellation never interrupts a tick
                if let Err(panic) = AssertUnwindSafe(task()).catch_unwind().await {
                    tracing::error!(
                        key = %task_key,
                        panic = %panic_message(panic.as_ref()),
                        "Scheduled tick panicked, schedule continues"
                    );
                }
            }

            tracing::debug!(key = %task_key, "Polling task stopped");
        });

        tasks.insert(key.to_string(), shutdown);
        true
    }

    /// Stop future ticks for `key`; `false` if nothing was scheduled
    pub fn cancel(&self, key: &str) -> bool {
        let removed = self.tasks.lock().unwrap().remove(key);
        match removed {
            Some(shutdown) => {
                // Err only if the task already exited
                let _ = shutdown.send(());
                true
            }
            None => false,
        }
    }

    /// Stop future ticks for every key; returns how many were scheduled
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<oneshot::Sender<()>> = self.tasks.lock().unwrap().drain().map(|(_, s)| s).collect();
        let count = drained.len();
        for shutdown in drained {
            let _ = shutdown.send(());
        }
        count
    }

    pub fn is_scheduled(&self, key: &str) -> bool {
        self.tasks.lock().unwrap().contains_key(key)
    }

    /// Scheduled keys, sorted
    pub fn scheduled_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.tasks.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn counting(counter: &Arc<AtomicUsize>) -> impl Fn() -> futures::future::Ready<()> + Send + Sync + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let scheduler = PollingScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        assert!(scheduler.schedule("RWA-001", HOUR, counting(&ticks)));

        time::sleep(HOUR / 2).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        time::sleep(HOUR * 3).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_schedule_keeps_one_task() {
        let scheduler = PollingScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        assert!(scheduler.schedule("RWA-001", HOUR, counting(&first)));
        assert!(!scheduler.schedule("RWA-001", HOUR, counting(&second)));
        assert_eq!(scheduler.len(), 1);

        time::sleep(HOUR * 2 + HOUR / 2).await;
        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_future_ticks() {
        let scheduler = PollingScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        scheduler.schedule("RWA-001", HOUR, counting(&ticks));

        time::sleep(HOUR + HOUR / 2).await;
        assert!(scheduler.cancel("RWA-001"));
        assert!(!scheduler.cancel("RWA-001"));
        assert!(!scheduler.is_scheduled("RWA-001"));

        time::sleep(HOUR * 5).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_tick_completes_after_cancel() {
        let scheduler = PollingScheduler::new();
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let (s, f) = (started.clone(), finished.clone());
        scheduler.schedule("RWA-001", HOUR, move || {
            let (s, f) = (s.clone(), f.clone());
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                time::sleep(Duration::from_secs(60)).await;
                f.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(HOUR + Duration::from_secs(1)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        scheduler.cancel("RWA-001");

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        time::sleep(HOUR * 3).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_tick_keeps_schedule() {
        let scheduler = PollingScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        scheduler.schedule("RWA-001", HOUR, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    panic!("first tick fails");
                }
            }
        });

        time::sleep(HOUR * 3 + HOUR / 2).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_scheduled("RWA-001"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_keys_and_drop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = PollingScheduler::new();
            scheduler.schedule("RWA-002", HOUR, counting(&ticks));
            scheduler.schedule("RWA-001", HOUR, counting(&ticks));
            assert_eq!(scheduler.scheduled_keys(), vec!["RWA-001", "RWA-002"]);

            time::sleep(HOUR + HOUR / 2).await;
            assert_eq!(ticks.load(Ordering::SeqCst), 2);
        }

        time::sleep(HOUR * 4).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
