//! Image-set rotation
//!
//! Cycles the dashboard through a list of [`ImageSet`]s (thermal image pair,
//! hot-spot seed and temperature limits) once per interval, aligned to the
//! wall-clock interval boundary.
//!
//! Scheduling is explicit: [`SetRotation::resume`] realigns immediately, arms a
//! one-shot sleep until the next boundary, realigns again there and then arms
//! a recurring interval. [`SetRotation::pause`] cancels both, so no catch-up
//! ticks pile up while the dashboard is hidden.
//!
//! ## Usage
//!
//! ```ignore
//! let mut rotation = SetRotation::new(config.rotation.sets.clone(), 60_000, clock)?
//!     .with_parent(&cancel);
//! rotation.attach_hot_seed(aggregator.hot_seed());
//! rotation.resume();
//! // hidden → visible
//! rotation.set_visible(false);
//! rotation.set_visible(true);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::SharedClock;
use crate::status::{HotLimits, HotSeed};
use crate::task::{TaskError, TaskHandle};
use crate::types::HotSpot;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("rotation needs at least one image set")]
    NoSets,
}

/// One rotation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub engine_img: String,
    pub hydraulic_img: String,
    /// Hot-spot seed shown while this set is active
    pub hot: HotSpot,
    /// Warning limits per sensor (°C)
    pub low_limit: HotSpot,
    /// Error limits per sensor (°C)
    pub high_limit: HotSpot,
}

impl ImageSet {
    pub fn limits(&self) -> HotLimits {
        HotLimits::from_bounds(self.low_limit, self.high_limit)
    }
}

/// The set currently on display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSet {
    pub index: usize,
    pub set: ImageSet,
}

/// Slot for `now_ms` when slots of `interval_ms` cycle through `len` sets.
pub fn aligned_index(now_ms: i64, interval_ms: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let slot = now_ms.div_euclid(interval_ms.max(1));
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    usize::try_from(slot.rem_euclid(len)).unwrap_or(0)
}

/// Milliseconds until the next multiple of `interval_ms`. Always in `1..=interval_ms`.
pub fn delay_to_boundary(now_ms: i64, interval_ms: i64) -> i64 {
    let interval = interval_ms.max(1);
    interval - now_ms.rem_euclid(interval)
}

// ============================================================================
// Publisher
// ============================================================================

/// Shared by the controller and its timer task.
#[derive(Clone)]
struct Publisher {
    sets: Arc<[ImageSet]>,
    interval_ms: i64,
    clock: SharedClock,
    tx: Arc<watch::Sender<ActiveSet>>,
    hot: Option<HotSeed>,
}

impl Publisher {
    fn publish(&self, index: usize) {
        let index = index % self.sets.len();
        let set = self.sets[index].clone();
        if let Some(hot) = &self.hot {
            hot.set(set.hot);
        }
        debug!(index, engine_img = %set.engine_img, "Image set active");
        self.tx.send_replace(ActiveSet { index, set });
    }

    fn realign(&self) -> usize {
        let index = aligned_index(self.clock.now_ms(), self.interval_ms, self.sets.len());
        self.publish(index);
        index
    }

    fn current_index(&self) -> usize {
        self.tx.borrow().index
    }

    async fn run(self, cancel: CancellationToken) {
        let delay = delay_to_boundary(self.clock.now_ms(), self.interval_ms);
        let delay = Duration::from_millis(u64::try_from(delay).unwrap_or(1));

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {
                self.realign();
            }
        }

        let period = Duration::from_millis(u64::try_from(self.interval_ms).unwrap_or(1));
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.publish(self.current_index() + 1);
                }
            }
        }
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// Minute-aligned image-set rotation with pause/resume.
pub struct SetRotation {
    publisher: Publisher,
    parent: CancellationToken,
    task: Option<TaskHandle<()>>,
}

impl SetRotation {
    /// Build an idle rotation; the first set is published until [`resume`](Self::resume).
    pub fn new(sets: Vec<ImageSet>, interval_ms: i64, clock: SharedClock) -> Result<Self, RotationError> {
        let first = sets.first().cloned().ok_or(RotationError::NoSets)?;
        let (tx, _) = watch::channel(ActiveSet { index: 0, set: first });
        Ok(Self {
            publisher: Publisher {
                sets: sets.into(),
                interval_ms: interval_ms.max(1),
                clock,
                tx: Arc::new(tx),
                hot: None,
            },
            parent: CancellationToken::new(),
            task: None,
        })
    }

    /// Tie the timer to `parent` so cancelling it stops the rotation.
    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.parent = parent.child_token();
        self
    }

    /// Push each newly active set's hot spot into `seed`.
    pub fn attach_hot_seed(&mut self, seed: HotSeed) {
        seed.set(self.current().set.hot);
        self.publisher.hot = Some(seed);
        if self.is_running() {
            // Running task holds the old publisher.
            self.resume();
        }
    }

    pub fn len(&self) -> usize {
        self.publisher.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publisher.sets.is_empty()
    }

    pub fn interval_ms(&self) -> i64 {
        self.publisher.interval_ms
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn current(&self) -> ActiveSet {
        self.publisher.tx.borrow().clone()
    }

    /// Limits of the active set, for status-level classification.
    pub fn current_limits(&self) -> HotLimits {
        self.publisher.tx.borrow().set.limits()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActiveSet> {
        self.publisher.tx.subscribe()
    }

    /// Realign to the wall clock now and re-arm the boundary timer.
    pub fn resume(&mut self) {
        self.cancel_timer();
        let index = self.publisher.realign();
        let publisher = self.publisher.clone();
        self.task = Some(TaskHandle::spawn(
            "rotation",
            self.parent.child_token(),
            move |token| publisher.run(token),
        ));
        info!(
            index,
            sets = self.len(),
            interval_ms = self.publisher.interval_ms,
            "Image rotation resumed"
        );
    }

    /// Clear both timers. The active set stays as it is.
    pub fn pause(&mut self) {
        if self.cancel_timer() {
            info!(index = self.current().index, "Image rotation paused");
        }
    }

    /// Visibility-driven pause/resume.
    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Pause and wait for the timer task to finish.
    pub async fn shutdown(mut self) -> Result<(), TaskError> {
        match self.task.take() {
            Some(task) => task.stop().await,
            None => Ok(()),
        }
    }

    fn cancel_timer(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.token().cancel();
                true
            }
            None => false,
        }
    }
}
