// ============================================================================
// Runner
// Self-managing run loop that drives repeated pairing attempts
// ============================================================================

use crate::domain::{EngineSnapshot, ParticipantId};
use crate::engine::PairingEngine;
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::interfaces::{
    EventHandler, IntervalPolicy, MatchingPolicy, MatchmakingEvent, NoOpEventHandler, PairHandler,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// Pending-tick state. `Scheduled` iff the loop is active.
#[derive(Debug)]
enum Schedule {
    Idle,
    Scheduled {
        /// Bumped on every start; ticks from an older run are ignored
        generation: u64,
        handle: JoinHandle<()>,
    },
}

struct RunState<P, S> {
    engine: PairingEngine<P, S>,
    schedule: Schedule,
    /// Kept across `stop` so elapsed time is only reset by the next `start`
    started_at: Option<Instant>,
    generation: u64,
}

impl<P, S> RunState<P, S> {
    fn is_running(&self) -> bool {
        matches!(self.schedule, Schedule::Scheduled { .. })
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(self.schedule, Schedule::Scheduled { generation: g, .. } if g == generation)
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default()
    }
}

struct Shared<P, S> {
    state: Mutex<RunState<P, S>>,
    pair_handler: Box<dyn PairHandler<P>>,
    interval: Box<dyn IntervalPolicy>,
    event_handler: Arc<dyn EventHandler>,
    runtime: Handle,
}

/// Run loop around one [`PairingEngine`].
///
/// ```text
///            start() / join()
///   Stopped ------------------> Running (tick scheduled)
///      ^                           |  tick: make_pairs, on_pair per pair,
///      |    pool empty / stop()    |  then reschedule after interval(...)
///      +---------------------------+
/// ```
///
/// The loop is active exactly while the pool is non-empty: `join` starts it,
/// a `leave` or tick that empties the pool stops it. At most one tick is
/// pending or executing at a time; the next one is scheduled only after the
/// current tick has delivered every pair. `stop` never interrupts a tick in
/// progress, it only prevents the next one.
///
/// Pair and event handlers run without the internal lock held, so they may
/// call back into the runner.
///
/// Cloning yields another handle to the same loop. Once every handle is
/// dropped, the pending tick (if any) exits without running.
pub struct Runner<P, S> {
    shared: Arc<Shared<P, S>>,
}

impl<P, S> Clone for Runner<P, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P, S> Runner<P, S>
where
    P: Clone + Send + 'static,
    S: MatchingPolicy<P> + 'static,
{
    /// Create a stopped runner on the current tokio runtime.
    pub fn new(
        engine: PairingEngine<P, S>,
        pair_handler: impl PairHandler<P> + 'static,
        interval: impl IntervalPolicy + 'static,
    ) -> MatchmakingResult<Self> {
        let runtime = Handle::try_current().map_err(|_| MatchmakingError::NoRuntime)?;
        Ok(Self::with_parts(
            engine,
            Box::new(pair_handler),
            Box::new(interval),
            Arc::new(NoOpEventHandler),
            runtime,
        ))
    }

    pub(crate) fn with_parts(
        engine: PairingEngine<P, S>,
        pair_handler: Box<dyn PairHandler<P>>,
        interval: Box<dyn IntervalPolicy>,
        event_handler: Arc<dyn EventHandler>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RunState {
                    engine,
                    schedule: Schedule::Idle,
                    started_at: None,
                    generation: 0,
                }),
                pair_handler,
                interval,
                event_handler,
                runtime,
            }),
        }
    }

    /// Add a participant and make sure the loop is running.
    pub fn join(&self, payload: P) -> Option<ParticipantId> {
        let mut events = Vec::new();
        let id = {
            let mut state = self.shared.state.lock();
            let id = state.engine.join_at(payload, Instant::now().into_std());

            events.push(match id {
                Some(participant_id) => MatchmakingEvent::ParticipantJoined {
                    participant_id,
                    timestamp: Utc::now(),
                },
                None => MatchmakingEvent::JoinRejected {
                    timestamp: Utc::now(),
                },
            });

            if !state.is_running() {
                self.shared.start_locked(&mut state, &mut events);
            }
            id
        };

        self.shared.event_handler.on_events(events);
        id
    }

    /// Remove a participant; stops the loop if the pool is now empty.
    pub fn leave(&self, id: ParticipantId) {
        let mut events = Vec::new();
        {
            let mut state = self.shared.state.lock();
            if state.engine.leave(id) {
                events.push(MatchmakingEvent::ParticipantLeft {
                    participant_id: id,
                    timestamp: Utc::now(),
                });
            }

            if state.engine.is_empty() {
                self.shared.stop_locked(&mut state, &mut events);
            }
        }

        self.shared.event_handler.on_events(events);
    }

    /// Start the loop. No-op if already running.
    pub fn start(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.shared.state.lock();
            self.shared.start_locked(&mut state, &mut events);
        }
        self.shared.event_handler.on_events(events);
    }

    /// Cancel the pending tick. No-op if already stopped.
    pub fn stop(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.shared.state.lock();
            self.shared.stop_locked(&mut state, &mut events);
        }
        self.shared.event_handler.on_events(events);
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().is_running()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().engine.is_empty()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.shared
            .state
            .lock()
            .engine
            .snapshot_at(Instant::now().into_std())
    }

    /// Inspect the engine under the runner's lock.
    ///
    /// The closure must not call back into the runner.
    pub fn with_engine<R>(&self, f: impl FnOnce(&PairingEngine<P, S>) -> R) -> R {
        f(&self.shared.state.lock().engine)
    }
}

impl<P, S> Shared<P, S>
where
    P: Clone + Send + 'static,
    S: MatchingPolicy<P> + 'static,
{
    fn start_locked(
        self: &Arc<Self>,
        state: &mut RunState<P, S>,
        events: &mut Vec<MatchmakingEvent>,
    ) {
        if state.is_running() {
            return;
        }

        let now = Instant::now();
        state.started_at = Some(now);
        state.generation += 1;

        let snapshot = state.engine.snapshot_at(now.into_std());
        let delay = self.interval.next_delay(&snapshot, Duration::ZERO);
        let generation = state.generation;
        state.schedule = Schedule::Scheduled {
            generation,
            handle: self.spawn_tick(generation, delay),
        };

        tracing::info!(generation, waiting = snapshot.waiting, "matchmaking loop started");
        events.push(MatchmakingEvent::RunnerStarted {
            timestamp: Utc::now(),
        });
    }

    fn stop_locked(&self, state: &mut RunState<P, S>, events: &mut Vec<MatchmakingEvent>) {
        let previous = std::mem::replace(&mut state.schedule, Schedule::Idle);
        let Schedule::Scheduled { handle, .. } = previous else {
            return;
        };

        // Only the sleep can be cancelled; a tick already past it finishes
        handle.abort();

        let elapsed = state.elapsed(Instant::now());
        tracing::info!(?elapsed, "matchmaking loop stopped");
        events.push(MatchmakingEvent::RunnerStopped {
            elapsed,
            timestamp: Utc::now(),
        });
    }

    fn spawn_tick(self: &Arc<Self>, generation: u64, delay: Duration) -> JoinHandle<()> {
        let shared: Weak<Self> = Arc::downgrade(self);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.tick(generation);
            }
        })
    }

    fn tick(self: &Arc<Self>, generation: u64) {
        let outcome = {
            let mut state = self.state.lock();
            if !state.is_current(generation) {
                return;
            }
            state.engine.make_pairs_at(Instant::now().into_std())
        };

        tracing::debug!(
            generation,
            pairs = outcome.pairs.len(),
            remaining = outcome.remaining.len(),
            "tick finished pairing"
        );
        self.event_handler.on_event(MatchmakingEvent::AttemptCompleted {
            pairs: outcome.pairs.len(),
            remaining: outcome.remaining.len(),
            timestamp: Utc::now(),
        });

        for pair in outcome.pairs {
            let (first, second) = (pair.first, pair.second);
            self.event_handler.on_event(MatchmakingEvent::PairFormed {
                match_id: Uuid::new_v4(),
                first: first.id,
                second: second.id,
                timestamp: Utc::now(),
            });
            self.pair_handler.on_pair(first, second);
        }

        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            // Stopped or restarted while handlers ran
            if !state.is_current(generation) {
                return;
            }

            if state.engine.is_empty() {
                self.stop_locked(&mut state, &mut events);
            } else {
                let now = Instant::now();
                let snapshot = state.engine.snapshot_at(now.into_std());
                let delay = self.interval.next_delay(&snapshot, state.elapsed(now));
                tracing::trace!(generation, ?delay, "next tick scheduled");
                state.schedule = Schedule::Scheduled {
                    generation,
                    handle: self.spawn_tick(generation, delay),
                };
            }
        }

        self.event_handler.on_events(events);
    }
}
