// SPDX-License-Identifier: GPL-3.0-only

//! Frame analyzer
//!
//! Capture threads hand every frame to [`AnalyzerHandle::submit`]. Frames
//! land in a single-entry slot: a newer frame replaces an older one that the
//! worker has not picked up yet, and the replaced buffer is released on the
//! spot. One dedicated worker thread takes frames out of the slot and drives
//! the decoder on the tokio runtime, so at most one frame is ever being
//! decoded.
//!
//! Each camera binding gets an id and a cancellation token. Starting a new
//! binding (or ending the current one) cancels the old token and clears the
//! slot. A decode still running for the old binding has its result dropped,
//! but the worker waits for the decoder to finish before it takes the next
//! frame: blocking decoder work cannot be aborted, and letting it run on
//! unattended would put two decodes side by side. Only shutdown stops
//! waiting. Frames that still carry an old id are released without being
//! decoded.
//!
//! Every buffer the analyzer accepts is released exactly once, whatever the
//! outcome.

use super::frame_buffer::{BindingId, FrameBuffer};
use super::router::ResultRouter;
use super::tasks::FrameDecoder;
use super::types::{FrameOutcome, RouteAction};
use crate::backends::camera::CameraFrame;
use crate::backends::camera::frame_loop::{LoopAction, LoopController};
use crate::constants::timing;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, trace};

/// A routed result, delivered from the worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEvent {
    /// Binding whose frame produced the action
    pub binding: BindingId,
    /// Frame number within that binding's stream
    pub sequence: u64,
    pub action: RouteAction,
}

type RouteFn = dyn Fn(RouteEvent) + Send + Sync;

/// Cancellation flag that async code can wait on
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<CancelInner>);

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelToken::cancel`] has been called
    pub async fn cancelled(&self) {
        let notified = self.0.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel cannot slip between
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Counters kept by the analyzer
#[derive(Debug, Default)]
struct AnalyzerStats {
    submitted: AtomicU64,
    replaced: AtomicU64,
    discarded: AtomicU64,
    released: AtomicU64,
    no_image: AtomicU64,
    stale: AtomicU64,
    matched: AtomicU64,
    unmatched: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl AnalyzerStats {
    fn record(&self, outcome: FrameOutcome) {
        let counter = match outcome {
            FrameOutcome::NoImage => &self.no_image,
            FrameOutcome::Stale => &self.stale,
            FrameOutcome::Matched => &self.matched,
            FrameOutcome::Unmatched => &self.unmatched,
            FrameOutcome::Failed => &self.failed,
            FrameOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn enter_decode(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }

    fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::SeqCst);
        StatsSnapshot {
            submitted: load(&self.submitted),
            replaced: load(&self.replaced),
            discarded: load(&self.discarded),
            released: load(&self.released),
            no_image: load(&self.no_image),
            stale: load(&self.stale),
            matched: load(&self.matched),
            unmatched: load(&self.unmatched),
            failed: load(&self.failed),
            cancelled: load(&self.cancelled),
            in_flight: load(&self.in_flight),
            peak_in_flight: load(&self.peak_in_flight),
        }
    }
}

struct InFlightGuard<'a>(&'a AnalyzerStats);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Point-in-time copy of the analyzer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames handed to the analyzer
    pub submitted: u64,
    /// Frames overwritten in the slot by a newer one
    pub replaced: u64,
    /// Frames dropped from the slot by a binding change or shutdown
    pub discarded: u64,
    /// Buffers created by [`AnalyzerHandle::submit_frame`] that have been released
    pub released: u64,
    pub no_image: u64,
    pub stale: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub failed: u64,
    pub cancelled: u64,
    /// Frames being decoded right now
    pub in_flight: u64,
    /// Highest number of frames ever decoded at once
    pub peak_in_flight: u64,
}

impl StatsSnapshot {
    /// Frames the worker finished with, whatever the outcome
    pub fn processed(&self) -> u64 {
        self.no_image + self.stale + self.matched + self.unmatched + self.failed + self.cancelled
    }

    /// Submitted frames not yet accounted for
    pub fn outstanding(&self) -> u64 {
        self.submitted
            .saturating_sub(self.processed() + self.replaced + self.discarded)
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames {} (skipped {}, discarded {}), matched {}, unmatched {}, failed {}, \
             no image {}, stale {}, cancelled {}",
            self.submitted,
            self.replaced,
            self.discarded,
            self.matched,
            self.unmatched,
            self.failed,
            self.no_image,
            self.stale,
            self.cancelled
        )
    }
}

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<FrameBuffer>,
    closed: bool,
}

/// Single-entry mailbox between capture threads and the worker
#[derive(Debug, Default)]
struct LatestSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl LatestSlot {
    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `buffer`, handing back whatever it displaced
    ///
    /// Returns `Err(buffer)` once the slot is closed. Callers drop the
    /// returned buffers after the lock is gone.
    fn put(&self, buffer: FrameBuffer) -> Result<Option<FrameBuffer>, FrameBuffer> {
        let mut state = self.lock();
        if state.closed {
            return Err(buffer);
        }
        let previous = state.pending.replace(buffer);
        drop(state);
        self.ready.notify_one();
        Ok(previous)
    }

    fn take_timeout(&self, timeout: Duration) -> Option<FrameBuffer> {
        let mut state = self.lock();
        if state.pending.is_none() && !state.closed {
            state = self
                .ready
                .wait_timeout(state, timeout)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.pending.take()
    }

    fn clear(&self) -> Option<FrameBuffer> {
        self.lock().pending.take()
    }

    fn close(&self) -> Option<FrameBuffer> {
        let mut state = self.lock();
        state.closed = true;
        let pending = state.pending.take();
        drop(state);
        self.ready.notify_all();
        pending
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[derive(Debug)]
struct Binding {
    id: BindingId,
    token: CancelToken,
}

struct Shared {
    slot: LatestSlot,
    binding: Mutex<Option<Binding>>,
    next_binding: AtomicU64,
    decoder: Arc<dyn FrameDecoder>,
    router: ResultRouter,
    on_route: Box<RouteFn>,
    stats: AnalyzerStats,
    shutdown: CancelToken,
}

impl Shared {
    fn binding(&self) -> std::sync::MutexGuard<'_, Option<Binding>> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Token of `id` if it is still the current binding
    fn token_for(&self, id: BindingId) -> Option<CancelToken> {
        self.binding()
            .as_ref()
            .filter(|binding| binding.id == id)
            .map(|binding| binding.token.clone())
    }

    fn discard_pending(&self) {
        if let Some(buffer) = self.slot.clear() {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            trace!(binding = buffer.binding(), "Discarding pending frame");
        }
    }

    fn analyze(&self, buffer: FrameBuffer, runtime: &Handle) -> FrameOutcome {
        let outcome = self.process(&buffer, runtime);
        buffer.release();
        self.stats.record(outcome);
        trace!(outcome = ?outcome, "Frame analyzed");
        outcome
    }

    fn process(&self, buffer: &FrameBuffer, runtime: &Handle) -> FrameOutcome {
        let binding = buffer.binding();
        let Some(token) = self.token_for(binding) else {
            return FrameOutcome::Stale;
        };
        let Some(frame) = buffer.frame() else {
            return FrameOutcome::NoImage;
        };
        let sequence = frame.sequence;
        let frame = frame.clone();

        let result = {
            let _in_flight = self.stats.enter_decode();
            runtime.block_on(async {
                let mut decode = self.decoder.decode(frame);
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {}
                    result = &mut decode => return Some(result),
                }

                // The frame stays in flight until the decoder is really done
                trace!(binding, sequence, "Waiting for abandoned decode to finish");
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => {}
                    _ = &mut decode => {}
                }
                None
            })
        };

        match result {
            None => {
                debug!(binding, sequence, "Decode abandoned, binding ended");
                FrameOutcome::Cancelled
            }
            Some(Ok(payloads)) => match self.router.route(&payloads) {
                Some(action) => {
                    debug!(binding, sequence, "Frame matched");
                    (self.on_route)(RouteEvent {
                        binding,
                        sequence,
                        action,
                    });
                    FrameOutcome::Matched
                }
                None => FrameOutcome::Unmatched,
            },
            Some(Err(e)) => {
                debug!(binding, sequence, error = %e, "Frame decode failed");
                FrameOutcome::Failed
            }
        }
    }
}

/// Cloneable entry point for capture threads
#[derive(Clone)]
pub struct AnalyzerHandle {
    shared: Arc<Shared>,
}

impl AnalyzerHandle {
    /// Offer a buffer; it replaces any frame still waiting
    pub fn submit(&self, buffer: FrameBuffer) {
        let stats = &self.shared.stats;
        stats.submitted.fetch_add(1, Ordering::Relaxed);
        match self.shared.slot.put(buffer) {
            Ok(Some(replaced)) => {
                stats.replaced.fetch_add(1, Ordering::Relaxed);
                trace!(binding = replaced.binding(), "Replacing unanalyzed frame");
            }
            Ok(None) => {}
            Err(_rejected) => {
                stats.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Wrap a captured frame in a buffer counted by the analyzer and submit it
    pub fn submit_frame(&self, frame: Option<CameraFrame>, binding: BindingId) {
        let shared = Arc::clone(&self.shared);
        self.submit(FrameBuffer::new(frame, binding, move || {
            shared.stats.released.fetch_add(1, Ordering::Relaxed);
        }));
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl std::fmt::Debug for AnalyzerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerHandle").finish_non_exhaustive()
    }
}

/// Owner of the analyzer worker thread
pub struct FrameAnalyzer {
    shared: Arc<Shared>,
    worker: Option<LoopController>,
}

impl FrameAnalyzer {
    /// Start the worker thread
    ///
    /// `runtime` must belong to a multi-threaded runtime that outlives the
    /// analyzer. `on_route` runs on the worker thread for every matched frame
    /// and should only hand the event over to the UI context.
    pub fn start<R>(
        decoder: Arc<dyn FrameDecoder>,
        router: ResultRouter,
        runtime: Handle,
        on_route: R,
    ) -> io::Result<Self>
    where
        R: Fn(RouteEvent) + Send + Sync + 'static,
    {
        info!(policy = %router.policy(), "Starting frame analyzer");

        let shared = Arc::new(Shared {
            slot: LatestSlot::default(),
            binding: Mutex::new(None),
            next_binding: AtomicU64::new(0),
            decoder,
            router,
            on_route: Box::new(on_route),
            stats: AnalyzerStats::default(),
            shutdown: CancelToken::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = LoopController::start("frame-analyzer", move || {
            match worker_shared.slot.take_timeout(timing::WORKER_POLL_INTERVAL) {
                Some(buffer) => {
                    worker_shared.analyze(buffer, &runtime);
                    LoopAction::Continue
                }
                None if worker_shared.slot.is_closed() => LoopAction::Stop,
                None => LoopAction::Continue,
            }
        })?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> AnalyzerHandle {
        AnalyzerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Start a new binding, abandoning whatever the previous one left behind
    pub fn begin_binding(&self) -> BindingId {
        let id = self.shared.next_binding.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.shared.binding().replace(Binding {
            id,
            token: CancelToken::new(),
        });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
        self.shared.discard_pending();
        debug!(binding = id, "Analyzer binding started");
        id
    }

    /// End the current binding; later frames from it are released undecoded
    pub fn end_binding(&self) {
        let previous = self.shared.binding().take();
        if let Some(previous) = previous {
            previous.token.cancel();
            debug!(binding = previous.id, "Analyzer binding ended");
        }
        self.shared.discard_pending();
    }

    pub fn current_binding(&self) -> Option<BindingId> {
        self.shared.binding().as_ref().map(|binding| binding.id)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(LoopController::is_running)
    }

    /// Stop the worker; idempotent
    pub fn shutdown(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        info!("Shutting down frame analyzer");
        self.shared.shutdown.cancel();
        if let Some(binding) = self.shared.binding().take() {
            binding.token.cancel();
        }
        if self.shared.slot.close().is_some() {
            self.shared.stats.discarded.fetch_add(1, Ordering::Relaxed);
        }
        worker.stop();
    }
}

impl Drop for FrameAnalyzer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FrameAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAnalyzer")
            .field("binding", &self.current_binding())
            .field("running", &self.is_running())
            .finish()
    }
}
