use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use session_model::TimingConfig;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::SessionError;
use crate::events::ShowImage;
use crate::library::ImageCollection;
use crate::scheduler::{PresentationScheduler, PresentationSnapshot};

/// Drives one presentation session.
///
/// Rules:
/// - Start the scheduler and hand its first image to the loader.
/// - Each wait is computed from the scheduler's state, then armed as a single
///   wake-up; there is no fixed-period timer.
/// - The next wait is armed only after the previous image was handed over.
/// - Cancellation drops the pending wake-up, so no tick lands after stop.
/// - Every state change is published on `snapshots`.
#[instrument(skip_all, fields(images = images.len(), timing = %timing))]
pub async fn run(
    images: Arc<ImageCollection>,
    timing: TimingConfig,
    seed: Option<u64>,
    to_loader: Sender<ShowImage>,
    snapshots: watch::Sender<PresentationSnapshot>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut scheduler = PresentationScheduler::from_seed(seed);
    let first = scheduler.start(images.len(), &timing)?;
    let started = Instant::now();
    snapshots.send_replace(scheduler.snapshot());

    let mut next = show_request(&images, first.current_index, first.lap);
    loop {
        let delivered = select! {
            biased;
            _ = cancel.cancelled() => break,
            res = to_loader.send(next) => res.is_ok(),
        };
        if !delivered {
            warn!("loader channel closed");
            break;
        }

        let armed_at = Instant::now();
        let Some(wait) = scheduler.next_wait(armed_at - started) else {
            break;
        };
        debug!(wait_ms = wait.as_millis() as u64, "waiting for next image");
        select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep_until(armed_at + wait) => {}
        }
        if cancel.is_cancelled() {
            break;
        }

        let Some(step) = scheduler.tick(started.elapsed()) else {
            break;
        };
        if step.wrapped {
            debug!(lap = step.lap, "new lap");
        }
        snapshots.send_replace(scheduler.snapshot());
        next = show_request(&images, step.current, step.lap);
    }

    if let Some(last) = scheduler.stop() {
        info!(
            last_index = last.current_index,
            lap = last.lap,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "presenter stopped"
        );
    }
    snapshots.send_replace(PresentationSnapshot::Idle);
    Ok(())
}

fn show_request(images: &ImageCollection, index: usize, lap: u64) -> ShowImage {
    // The scheduler only yields indices below `images.len()`.
    let path = images
        .get(index)
        .map(|entry| entry.path.clone())
        .unwrap_or_default();
    ShowImage { index, path, lap }
}

/// One entry of a simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStep {
    /// Offset from session start at which the image appears.
    pub at: Duration,
    pub index: usize,
    pub lap: u64,
    /// How long the image stays up.
    pub wait: Duration,
}

/// Plan `steps` images of a session over `len` images without sleeping.
pub fn simulate(
    len: usize,
    timing: &TimingConfig,
    seed: Option<u64>,
    steps: usize,
) -> Result<Vec<PlannedStep>, SessionError> {
    let mut scheduler = PresentationScheduler::from_seed(seed);
    let first = scheduler.start(len, timing)?;
    let mut elapsed = Duration::ZERO;
    let mut index = first.current_index;
    let mut lap = first.lap;
    let mut plan = Vec::with_capacity(steps);

    for _ in 0..steps {
        let Some(wait) = scheduler.next_wait(elapsed) else {
            break;
        };
        plan.push(PlannedStep {
            at: elapsed,
            index,
            lap,
            wait,
        });
        elapsed += wait;
        let Some(step) = scheduler.tick(elapsed) else {
            break;
        };
        index = step.current;
        lap = step.lap;
    }
    scheduler.stop();
    Ok(plan)
}
