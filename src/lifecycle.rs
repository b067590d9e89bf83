//! Debounced, cancellable request lifecycle with stale-completion guarding.
//!
//! A [`LifecycleController`] drives one parameterized asynchronous operation.
//! Every (re)trigger bumps a generation counter, cancels the previous timer
//! and in-flight call, and schedules the operation after the debounce delay.
//! Completions publish through a `watch` channel guarded by the generation
//! counter, so an older, slower request can never overwrite the state
//! produced by a newer one: results apply in trigger order, not completion
//! order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{ErrorInfo, RequestError};

/// Phase of the current logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Loading,
    Success,
    Error,
    Canceled,
}

/// Tri-state result of the controller's current generation.
#[derive(Debug, Clone)]
pub struct RequestState<T> {
    pub phase: RequestPhase,
    pub result: Option<T>,
    pub error: Option<ErrorInfo>,
    /// Identifies which logical request produced this state.
    pub generation: u64,
}

impl<T> RequestState<T> {
    fn idle(generation: u64) -> Self {
        Self {
            phase: RequestPhase::Idle,
            result: None,
            error: None,
            generation,
        }
    }

    fn loading(generation: u64) -> Self {
        Self {
            phase: RequestPhase::Loading,
            result: None,
            error: None,
            generation,
        }
    }

    fn canceled(generation: u64) -> Self {
        Self {
            phase: RequestPhase::Canceled,
            result: None,
            error: None,
            generation,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == RequestPhase::Loading
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::idle(0)
    }
}

/// The asynchronous operation a controller drives.
///
/// Implementations must honor the token: the controller additionally races
/// the returned future against it, which drops (and thereby aborts) the
/// underlying transport call when the token fires first.
#[async_trait]
pub trait Operation<I, T>: Send + Sync {
    async fn run(&self, input: I, cancel: CancellationToken) -> Result<T, RequestError>;
}

/// Drives one operation with debounce, cancellation, and tri-state result
/// tracking. Exactly one request per controller is logically current at any
/// time; superseded requests may still be physically in flight but their
/// completions are discarded.
///
/// Requires a tokio runtime: `configure` spawns the scheduled execution.
pub struct LifecycleController<I, T> {
    op: Arc<dyn Operation<I, T>>,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    in_flight: Option<CancellationToken>,
    state_tx: Arc<watch::Sender<RequestState<T>>>,
}

impl<I, T> LifecycleController<I, T>
where
    I: Send + 'static,
    T: Send + Sync + 'static,
{
    pub fn new(op: Arc<dyn Operation<I, T>>, debounce: Duration) -> Self {
        let (state_tx, _) = watch::channel(RequestState::default());
        Self {
            op,
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            state_tx: Arc::new(state_tx),
        }
    }

    /// Current generation counter. Monotonically increasing; bumped on every
    /// trigger and on every reset.
    pub fn generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<T>
    where
        T: Clone,
    {
        self.state_tx.borrow().clone()
    }

    /// Watch the state across transitions.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state_tx.subscribe()
    }

    /// Called on every change to the trigger inputs.
    ///
    /// With `enabled == false` or an absent input the controller resets to
    /// idle and schedules nothing. Otherwise the previous timer and in-flight
    /// call are canceled and the operation is scheduled after the debounce
    /// delay under a fresh generation.
    pub fn configure(&mut self, input: Option<I>, enabled: bool) {
        let Some(input) = input.filter(|_| enabled) else {
            self.reset();
            return;
        };

        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(prev) = self.in_flight.take() {
            prev.cancel();
        }
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        trace!(generation, "Scheduling request");

        let op = Arc::clone(&self.op);
        let latest = Arc::clone(&self.latest);
        let state_tx = Arc::clone(&self.state_tx);
        let debounce = self.debounce;

        tokio::spawn(async move {
            if debounce > Duration::ZERO {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = sleep(debounce) => {}
                }
            } else if cancel.is_cancelled() {
                return;
            }

            publish(&state_tx, &latest, generation, RequestState::loading(generation));

            let outcome = tokio::select! {
                _ = cancel.cancelled() => Err(RequestError::Canceled),
                res = op.run(input, cancel.clone()) => res,
            };

            match outcome {
                Ok(value) => {
                    let applied = publish(
                        &state_tx,
                        &latest,
                        generation,
                        RequestState {
                            phase: RequestPhase::Success,
                            result: Some(value),
                            error: None,
                            generation,
                        },
                    );
                    if !applied {
                        debug!(generation, "Discarding stale completion");
                    }
                }
                Err(err) if err.is_cancellation() => {
                    publish(&state_tx, &latest, generation, RequestState::canceled(generation));
                }
                Err(err) => {
                    let applied = publish(
                        &state_tx,
                        &latest,
                        generation,
                        RequestState {
                            phase: RequestPhase::Error,
                            result: None,
                            error: Some(ErrorInfo::from(&err)),
                            generation,
                        },
                    );
                    if !applied {
                        debug!(generation, "Discarding stale failure");
                    }
                }
            }
        });
    }

    /// Abort the pending timer and in-flight operation, if any. The state
    /// becomes canceled with no error. Safe to call repeatedly; a request
    /// that already reached a terminal state is left untouched.
    pub fn cancel(&mut self) {
        let Some(token) = self.in_flight.take() else {
            return;
        };
        token.cancel();
        let generation = self.latest.load(Ordering::Acquire);
        debug!(generation, "Canceled current request");
        self.state_tx.send_if_modified(|state| {
            let completed = state.generation == generation
                && matches!(
                    state.phase,
                    RequestPhase::Success | RequestPhase::Error | RequestPhase::Canceled
                );
            if completed {
                return false;
            }
            *state = RequestState::canceled(generation);
            true
        });
    }

    /// Cancel anything outstanding and return to idle, dropping any held
    /// result. Bumps the generation so straggler completions are stale.
    pub fn reset(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        self.state_tx
            .send_modify(|state| *state = RequestState::idle(generation));
    }
}

impl<I, T> Drop for LifecycleController<I, T> {
    fn drop(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

/// Apply `next` only if `generation` is still the latest one; stale
/// completions are dropped without touching shared state.
fn publish<T>(
    state_tx: &watch::Sender<RequestState<T>>,
    latest: &AtomicU64,
    generation: u64,
    next: RequestState<T>,
) -> bool {
    state_tx.send_if_modified(|state| {
        if latest.load(Ordering::Acquire) != generation {
            return false;
        }
        *state = next;
        true
    })
}
