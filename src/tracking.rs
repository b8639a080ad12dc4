//! Live bus tracking.
//!
//! [`ScheduledTask`] runs a callback on a fixed interval until its
//! [`TaskHandle`] is cancelled or dropped. [`BusTracker`] owns at most one
//! such handle and re-targets it when the tracked bus changes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};

use crate::model::BusPosition;
use crate::services::plan_api::PlanApi;

/// Handle to a running [`ScheduledTask`]. Dropping it cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct ScheduledTask;

impl ScheduledTask {
    /// Calls `callback` immediately and then every `interval`. A slow
    /// callback delays the next tick rather than causing a burst.
    pub fn start<F, Fut>(interval: Duration, mut callback: F) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback().await;
            }
        });
        TaskHandle { handle }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackedPosition {
    pub bus_number: u32,
    pub position: BusPosition,
    pub observed_at: DateTime<Utc>,
}

/// Polls one bus's location for as long as it is tracking.
pub struct BusTracker<A: ?Sized> {
    api: Arc<A>,
    interval: Duration,
    current: Option<(u32, TaskHandle)>,
    latest: Arc<watch::Sender<Option<TrackedPosition>>>,
}

impl<A: PlanApi + ?Sized + 'static> BusTracker<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            api,
            interval,
            current: None,
            latest: Arc::new(latest),
        }
    }

    pub fn tracked_bus(&self) -> Option<u32> {
        self.current.as_ref().map(|(bus, _)| *bus)
    }

    pub fn latest(&self) -> Option<TrackedPosition> {
        *self.latest.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TrackedPosition>> {
        self.latest.subscribe()
    }

    /// Starts polling `bus_number`, cancelling any poll for another bus.
    /// Tracking the bus already tracked is a no-op.
    pub fn track(&mut self, bus_number: u32) {
        if self.tracked_bus() == Some(bus_number) {
            return;
        }
        self.stop();

        let api = Arc::clone(&self.api);
        let latest = Arc::clone(&self.latest);
        let span = tracing::info_span!("track_bus", bus_number);

        let handle = ScheduledTask::start(self.interval, move || {
            let api = Arc::clone(&api);
            let latest = Arc::clone(&latest);
            async move {
                match api.bus_location(bus_number).await {
                    Ok(Some(position)) => {
                        debug!(
                            latitude = position.latitude,
                            longitude = position.longitude,
                            "Bus position updated"
                        );
                        latest.send_replace(Some(TrackedPosition {
                            bus_number,
                            position,
                            observed_at: Utc::now(),
                        }));
                    }
                    Ok(None) => debug!("No position reported yet"),
                    Err(e) => warn!(error = %e, "Bus location poll failed"),
                }
            }
            .instrument(span.clone())
        });

        info!(bus_number, interval_secs = self.interval.as_secs(), "Tracking bus");
        self.current = Some((bus_number, handle));
    }

    /// Stops polling and forgets the last position.
    pub fn stop(&mut self) {
        if let Some((bus_number, handle)) = self.current.take() {
            handle.cancel();
            self.latest.send_replace(None);
            info!(bus_number, "Stopped tracking bus");
        }
    }
}
