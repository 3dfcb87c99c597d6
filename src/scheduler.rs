use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

/// Process-wide trigger for sync runs.
pub trait Scheduler: Send + Sync {
    /// Run roughly every `interval`, anywhere inside the trailing `flex` window.
    fn register_periodic(&self, interval: Duration, flex: Duration);

    /// Request a run as soon as the worker is free.
    fn trigger_now(&self);
}

#[derive(Clone, Copy, Debug)]
struct Period {
    interval: Duration,
    flex: Duration,
}

impl Period {
    fn next_delay(&self) -> Duration {
        let flex_ms = self.flex.min(self.interval).as_millis() as u64;
        self.interval.saturating_sub(Duration::from_millis(jitter_ms(flex_ms)))
    }
}

/// Single background worker; runs never overlap and triggers that arrive
/// mid-run collapse into one follow-up run.
pub struct TokioScheduler {
    trigger: Arc<Notify>,
    period: watch::Sender<Option<Period>>,
    completed: Arc<AtomicU64>,
    worker: JoinHandle<()>,
}

impl TokioScheduler {
    pub fn spawn<F, Fut>(job: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let trigger = Arc::new(Notify::new());
        let (period, mut period_rx) = watch::channel(None::<Period>);
        let completed = Arc::new(AtomicU64::new(0));

        let worker = {
            let trigger = trigger.clone();
            let completed = completed.clone();
            tokio::spawn(async move {
                loop {
                    let current = *period_rx.borrow_and_update();
                    let reason = match current {
                        Some(p) => {
                            let delay = p.next_delay();
                            debug!(delay_secs = delay.as_secs(), "next periodic sync scheduled");
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => "periodic",
                                _ = trigger.notified() => "manual",
                                changed = period_rx.changed() => {
                                    if changed.is_err() {
                                        break;
                                    }
                                    continue;
                                },
                            }
                        },
                        None => tokio::select! {
                            _ = trigger.notified() => "manual",
                            changed = period_rx.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                                continue;
                            },
                        },
                    };

                    info!(reason, "starting sync run");
                    job().await;
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                debug!("scheduler worker stopped");
            })
        };

        Self { trigger, period, completed, worker }
    }

    pub fn completed_runs(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl Scheduler for TokioScheduler {
    fn register_periodic(&self, interval: Duration, flex: Duration) {
        info!(interval_secs = interval.as_secs(), flex_secs = flex.as_secs(), "periodic sync registered");
        self.period.send_replace(Some(Period { interval, flex }));
    }

    fn trigger_now(&self) {
        self.trigger.notify_one();
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

fn jitter_ms(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let nanos =
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.subsec_nanos() as u64).unwrap_or(0);
    nanos % (max + 1)
}

#[cfg(test)]
mod tests {
    use tokio::sync::{Semaphore, mpsc};

    use super::*;

    fn spawn_counting() -> (TokioScheduler, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::spawn(move || {
            let tx = tx.clone();
            async move {
                let _ = tx.send(());
            }
        });
        (scheduler, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_now_runs_once() {
        let (scheduler, mut runs) = spawn_counting();

        scheduler.trigger_now();
        runs.recv().await.unwrap();

        let extra = tokio::time::timeout(Duration::from_secs(3600), runs.recv()).await;
        assert!(extra.is_err(), "no run without a trigger or period");
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_runs_repeat() {
        let (scheduler, mut runs) = spawn_counting();
        scheduler.register_periodic(Duration::from_secs(86_400), Duration::ZERO);

        let start = tokio::time::Instant::now();
        runs.recv().await.unwrap();
        runs.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2 * 86_400));
    }

    #[tokio::test(start_paused = true)]
    async fn triggers_during_a_run_coalesce() {
        let gate = Arc::new(Semaphore::new(0));
        let (tx, mut runs) = mpsc::unbounded_channel();

        let scheduler = {
            let gate = gate.clone();
            TokioScheduler::spawn(move || {
                let gate = gate.clone();
                let tx = tx.clone();
                async move {
                    let _ = tx.send(());
                    gate.acquire().await.unwrap().forget();
                }
            })
        };

        scheduler.trigger_now();
        runs.recv().await.unwrap();

        scheduler.trigger_now();
        scheduler.trigger_now();
        scheduler.trigger_now();
        gate.add_permits(10);

        runs.recv().await.unwrap();
        let extra = tokio::time::timeout(Duration::from_secs(60), runs.recv()).await;
        assert!(extra.is_err());
        assert_eq!(scheduler.completed_runs(), 2);
    }

    #[test]
    fn delay_stays_inside_flex_window() {
        let period = Period { interval: Duration::from_secs(100), flex: Duration::from_secs(30) };
        for _ in 0..50 {
            let delay = period.next_delay();
            assert!(delay <= Duration::from_secs(100));
            assert!(delay >= Duration::from_secs(70));
        }
    }
}
