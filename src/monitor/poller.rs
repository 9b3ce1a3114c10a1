//! Poll cycle scheduling
//!
//! One run loop owns the periodic timer regardless of how many observers are
//! connected. On-demand cycles arrive over the refresh channel (control
//! handlers, first-subscriber warm-up). The in-flight guard keeps a slow
//! listing command from letting two overlapping cycles race to publish a
//! stale snapshot over a fresh one.

use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{broadcaster::Broadcaster, inventory::Inventory, parser};
use crate::{backend::ServiceManager, errors::AppError, sampler::ResourceSampler};

pub struct InventoryPoller {
    manager: Arc<dyn ServiceManager>,
    sampler: Arc<dyn ResourceSampler>,
    broadcaster: Arc<Broadcaster>,
    in_flight: Mutex<()>,
}

impl InventoryPoller {
    pub fn new(
        manager: Arc<dyn ServiceManager>,
        sampler: Arc<dyn ResourceSampler>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            manager,
            sampler,
            broadcaster,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one list-parse-publish cycle. Returns `Ok(false)` when a cycle is
    /// already in flight (the new request is dropped, not queued). On a
    /// listing failure nothing is published and the previous snapshot stays
    /// current.
    pub async fn poll_once(&self) -> Result<bool, AppError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("poll already in flight, skipping");
            return Ok(false);
        };

        let raw = self.manager.list_services().await?;
        let services = parser::parse(&raw);
        let gauges = self.sampler.sample();
        let inventory = Arc::new(Inventory::new(services, gauges));

        debug!(
            services = inventory.services.len(),
            running = inventory.running,
            stopped = inventory.stopped,
            failed = inventory.failed,
            "inventory refreshed"
        );
        self.broadcaster.publish(inventory).await;
        Ok(true)
    }

    /// Periodic loop plus on-demand refreshes. The first tick fires
    /// immediately so the inventory exists right after startup. The loop
    /// ends when every refresh sender has been dropped.
    pub async fn run(
        self: Arc<Self>,
        interval: Duration,
        mut refresh_rx: mpsc::UnboundedReceiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "inventory poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                request = refresh_rx.recv() => {
                    if request.is_none() {
                        info!("refresh channel closed, inventory poller stopping");
                        return;
                    }
                }
            }

            if let Err(err) = self.poll_once().await {
                warn!(error = %err, "poll cycle failed, keeping previous inventory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::{mpsc, Notify};

    use super::InventoryPoller;
    use crate::{
        backend::ServiceManager,
        errors::AppError,
        monitor::{broadcaster::Broadcaster, controller::tests::StubManager},
        sampler::tests::FixedSampler,
    };

    fn poller_with(
        manager: Arc<dyn ServiceManager>,
    ) -> (Arc<InventoryPoller>, Arc<Broadcaster>, mpsc::UnboundedReceiver<()>) {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let broadcaster = Arc::new(Broadcaster::new(refresh_tx.downgrade()));
        let sampler = Arc::new(FixedSampler::new(10.0, 20.0));
        let poller = Arc::new(InventoryPoller::new(manager, sampler, broadcaster.clone()));
        (poller, broadcaster, refresh_rx)
    }

    #[tokio::test]
    async fn successful_poll_publishes_parsed_snapshot() {
        let manager = Arc::new(StubManager {
            listing: concat!(
                "NOMBRE_SERVICIO: Spooler\n",
                "ESTADO : 4  RUNNING\n",
                "NOMBRE_SERVICIO: wuauserv\n",
                "ESTADO : 1  STOPPED\n",
            )
            .to_string(),
            ..StubManager::new()
        });
        let (poller, broadcaster, _refresh_rx) = poller_with(manager);

        let published = poller.poll_once().await.expect("poll succeeds");
        assert!(published);

        let inventory = broadcaster.latest().await.expect("snapshot published");
        assert_eq!(inventory.services.len(), 2);
        assert_eq!(inventory.running, 1);
        assert_eq!(inventory.stopped, 1);
        assert_eq!(inventory.failed, 0);
        assert_eq!(inventory.cpu_usage_percent, 10.0);
        assert_eq!(inventory.memory_usage_percent, 20.0);
    }

    #[tokio::test]
    async fn failed_listing_keeps_previous_snapshot() {
        struct FlakyManager {
            fail: std::sync::atomic::AtomicBool,
        }

        #[async_trait]
        impl ServiceManager for FlakyManager {
            async fn list_services(&self) -> Result<String, AppError> {
                if self.fail.load(Ordering::SeqCst) {
                    return Err(AppError::command_failed("sc queryex state= all", "stub"));
                }
                Ok("NOMBRE_SERVICIO: Spooler\nESTADO : RUNNING\n".to_string())
            }

            async fn start_service(&self, _name: &str) -> Result<(), AppError> {
                Ok(())
            }

            async fn stop_service(&self, _name: &str) -> Result<(), AppError> {
                Ok(())
            }
        }

        let manager = Arc::new(FlakyManager {
            fail: std::sync::atomic::AtomicBool::new(false),
        });
        let (poller, broadcaster, _refresh_rx) = poller_with(manager.clone());
        let mut subscription = broadcaster.subscribe().await;

        poller.poll_once().await.expect("first poll succeeds");
        let first = subscription.recv().await.expect("first snapshot");

        manager.fail.store(true, Ordering::SeqCst);
        let err = poller.poll_once().await.expect_err("second poll fails");
        assert!(matches!(err, AppError::CommandFailed { .. }));

        assert!(subscription.try_recv().is_none(), "no publish on failure");
        let latest = broadcaster.latest().await.expect("snapshot retained");
        assert_eq!(&*latest, &*first);
    }

    #[tokio::test]
    async fn overlapping_poll_is_skipped_not_queued() {
        struct BlockingManager {
            release: Arc<Notify>,
            calls: AtomicUsize,
        }

        #[async_trait]
        impl ServiceManager for BlockingManager {
            async fn list_services(&self) -> Result<String, AppError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.release.notified().await;
                Ok(String::new())
            }

            async fn start_service(&self, _name: &str) -> Result<(), AppError> {
                Ok(())
            }

            async fn stop_service(&self, _name: &str) -> Result<(), AppError> {
                Ok(())
            }
        }

        let release = Arc::new(Notify::new());
        let manager = Arc::new(BlockingManager {
            release: release.clone(),
            calls: AtomicUsize::new(0),
        });
        let (poller, _broadcaster, _refresh_rx) = poller_with(manager.clone());

        let slow = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll_once().await })
        };
        tokio::task::yield_now().await;

        let skipped = poller.poll_once().await.expect("second call returns");
        assert!(!skipped, "overlapping cycle must be skipped");

        release.notify_one();
        let published = slow
            .await
            .expect("task completes")
            .expect("first poll succeeds");
        assert!(published);
        assert_eq!(manager.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_loop_polls_on_refresh_request_and_stops_on_close() {
        let manager = Arc::new(StubManager {
            listing: "NOMBRE_SERVICIO: Spooler\nESTADO : RUNNING\n".to_string(),
            ..StubManager::new()
        });
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let broadcaster = Arc::new(Broadcaster::new(refresh_tx.downgrade()));
        let sampler = Arc::new(FixedSampler::new(0.0, 0.0));
        let poller = Arc::new(InventoryPoller::new(
            manager,
            sampler,
            broadcaster.clone(),
        ));

        let handle = tokio::spawn(poller.clone().run(Duration::from_secs(3600), refresh_rx));

        let mut subscription = broadcaster.subscribe().await;
        // Either the immediate first tick or the warm-up refresh publishes.
        let snapshot = subscription.recv().await.expect("snapshot arrives");
        assert_eq!(snapshot.services[0].name, "Spooler");

        drop(refresh_tx);
        drop(broadcaster);
        drop(subscription);
        handle.await.expect("run loop exits cleanly");
    }
}
