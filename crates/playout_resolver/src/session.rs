// SPDX-License-Identifier: MIT OR Apache-2.0
//! The incremental resolver session.
//!
//! A session owns every group's latest compiled timeline plus the device
//! mappings, and keeps a resolved-states snapshot and an instant playback
//! state up to date under rapid edits. Edits invalidate the snapshot and
//! request a resolve; requests are debounced into a single pending trigger at
//! the earliest requested time, and at most one resolve pass is ever in
//! flight.
//!
//! A resolve pass suspends voluntarily after each heavy primitive call. If an
//! invalidation lands during such a suspension the in-flight result is
//! discarded and a fresh pass is scheduled; in-flight work is never
//! preempted. After publishing, the session re-arms its timer exactly at the
//! snapshot's next state-change event, so a quiet timeline costs nothing.

use crate::mappings::Mappings;
use crate::primitive::{ResolveError, ResolvePrimitive, ResolvedStates, TimelineState};
use indexmap::IndexMap;
use parking_lot::Mutex;
use playout_timeline::{
    compile_group, CompileOptions, CompiledTimelineObject, Group, PreparedSchedule,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

/// How far ahead one resolve pass evaluates the timeline
const RESOLVE_LOOKAHEAD: Duration = Duration::from_secs(60);
/// Delay before retrying after a primitive failure
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Where the session is in its resolve cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolvePhase {
    /// Nothing pending
    Idle,
    /// A resolve is armed for `at_ms` on the session clock
    Scheduled {
        /// Trigger time in session milliseconds
        at_ms: u64,
    },
    /// A resolve pass is running
    Resolving,
}

/// Mutable session state; only touched under the lock, never across an await
struct SessionState<C> {
    /// Latest compiled timeline per group id
    timelines: IndexMap<String, Vec<CompiledTimelineObject>>,
    /// Current device-mapping table
    mappings: Mappings,
    /// Primitive working memory, threaded through consecutive calls
    cache: C,
    /// Last published resolved-states snapshot
    snapshot: Option<Arc<ResolvedStates>>,
    /// Last published instant state
    instant: Option<TimelineState>,
    /// Snapshot horizon; `None` = invalidated, must re-resolve
    snapshot_valid_until: Option<u64>,
    /// Instant-state horizon; `None` = must re-derive, `u64::MAX` = forever
    state_valid_until: Option<u64>,
    /// Bumped on every invalidation; lets an in-flight pass detect staleness
    invalidations: u64,
    /// Resolve cycle phase
    phase: ResolvePhase,
    /// A trigger fired while resolving; run once more after completion
    run_again: bool,
}

struct Inner<P: ResolvePrimitive> {
    /// Session id for log correlation
    id: Uuid,
    /// The external resolve library
    primitive: P,
    /// Session clock zero
    epoch: tokio::time::Instant,
    state: Mutex<SessionState<P::Cache>>,
    /// Wakes the timer loop when the pending trigger changes
    wake: Notify,
}

/// A per-device-timeline resolver session.
///
/// Construct inside a tokio runtime; a background task owns the debounce
/// timer and the resolve loop, and is aborted on drop. All public methods are
/// non-blocking.
pub struct ResolverSession<P: ResolvePrimitive> {
    inner: Arc<Inner<P>>,
    task: tokio::task::JoinHandle<()>,
}

impl<P: ResolvePrimitive> ResolverSession<P> {
    /// Create a session around the given resolve primitive
    pub fn new(primitive: P) -> Self {
        let inner = Arc::new(Inner {
            id: Uuid::new_v4(),
            primitive,
            epoch: tokio::time::Instant::now(),
            state: Mutex::new(SessionState {
                timelines: IndexMap::new(),
                mappings: Mappings::new(),
                cache: P::Cache::default(),
                snapshot: None,
                instant: None,
                snapshot_valid_until: None,
                state_valid_until: None,
                invalidations: 0,
                phase: ResolvePhase::Idle,
                run_again: false,
            }),
            wake: Notify::new(),
        });
        let task = tokio::spawn(run_loop(Arc::clone(&inner)));
        Self { inner, task }
    }

    /// Milliseconds elapsed on the session clock
    pub fn now_ms(&self) -> u64 {
        self.inner.now_ms()
    }

    /// Recompile a group's timeline and, if it changed, invalidate the
    /// snapshot and request a resolve.
    ///
    /// A group that no longer produces a timeline is removed from the
    /// session, going through the same invalidation path.
    pub fn update_group(
        &self,
        group: &Group,
        schedule: Option<&PreparedSchedule>,
        opts: &CompileOptions,
    ) {
        let compiled = compile_group(group, schedule, opts);
        let changed = {
            let mut st = self.inner.state.lock();
            let changed = match compiled {
                Some(objects) => {
                    if st.timelines.get(&group.id) == Some(&objects) {
                        false
                    } else {
                        st.timelines.insert(group.id.clone(), objects);
                        true
                    }
                }
                None => st.timelines.shift_remove(&group.id).is_some(),
            };
            if changed {
                st.snapshot_valid_until = None;
                st.invalidations += 1;
            }
            changed
        };
        if changed {
            tracing::debug!(session = %self.inner.id, group = %group.id, "group timeline changed");
            self.inner.schedule_resolve_at(self.inner.now_ms());
        }
    }

    /// Replace the device-mapping table; a changed table invalidates the
    /// snapshot the same way a group edit does
    pub fn update_mappings(&self, mappings: Mappings) {
        let changed = {
            let mut st = self.inner.state.lock();
            if st.mappings == mappings {
                false
            } else {
                st.mappings = mappings;
                st.snapshot_valid_until = None;
                st.invalidations += 1;
                true
            }
        };
        if changed {
            tracing::debug!(session = %self.inner.id, "device mappings changed");
            self.inner.schedule_resolve_at(self.inner.now_ms());
        }
    }

    /// The last published resolved-states snapshot, if any
    pub fn resolved_timeline(&self) -> Option<Arc<ResolvedStates>> {
        self.inner.state.lock().snapshot.clone()
    }

    /// The last published instant state, if any
    pub fn state(&self) -> Option<TimelineState> {
        self.inner.state.lock().instant.clone()
    }

    /// The current device-mapping table
    pub fn mappings(&self) -> Mappings {
        self.inner.state.lock().mappings.clone()
    }
}

impl<P: ResolvePrimitive> Drop for ResolverSession<P> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<P: ResolvePrimitive> Inner<P> {
    fn now_ms(&self) -> u64 {
        (tokio::time::Instant::now() - self.epoch).as_millis() as u64
    }

    /// Arm the single resolve trigger. Calls coalesce: a pending trigger is
    /// only moved when the new request is earlier. A trigger arriving while a
    /// pass is running is deferred to run-again.
    fn schedule_resolve_at(&self, at_ms: u64) {
        let mut st = self.state.lock();
        match st.phase {
            ResolvePhase::Resolving => {
                st.run_again = true;
            }
            ResolvePhase::Scheduled { at_ms: pending } if pending <= at_ms => {}
            _ => {
                st.phase = ResolvePhase::Scheduled { at_ms };
                self.wake.notify_one();
            }
        }
    }

    fn invalidated_since(&self, generation: u64) -> bool {
        self.state.lock().invalidations != generation
    }

    /// One full resolve pass, entered from the timer loop
    async fn resolve_once(&self) {
        let now = self.now_ms();
        {
            let mut st = self.state.lock();
            if st.phase == ResolvePhase::Resolving {
                st.run_again = true;
                return;
            }
            st.phase = ResolvePhase::Resolving;
        }
        tracing::debug!(session = %self.id, time_ms = now, "resolve pass started");

        let next_wake = match self.resolve_body(now).await {
            Ok(next_wake) => next_wake,
            Err(error) => {
                tracing::warn!(
                    session = %self.id,
                    %error,
                    "resolve failed; keeping last-known-good snapshot"
                );
                Some(now + RETRY_DELAY.as_millis() as u64)
            }
        };

        let run_again = {
            let mut st = self.state.lock();
            st.phase = ResolvePhase::Idle;
            std::mem::take(&mut st.run_again)
        };
        if run_again {
            self.schedule_resolve_at(self.now_ms());
        } else if let Some(at_ms) = next_wake {
            self.schedule_resolve_at(at_ms);
        }
    }

    /// The resolve body. Returns the next wanted wakeup time, or an error
    /// from the primitive boundary.
    async fn resolve_body(&self, now: u64) -> Result<Option<u64>, ResolveError> {
        // Snapshot the inputs under the lock; the lock is never held across
        // an await
        let (objects, generation, snapshot_fresh, mut cache) = {
            let mut st = self.state.lock();
            let fresh =
                st.snapshot.is_some() && st.snapshot_valid_until.is_some_and(|t| t > now);
            let objects = if fresh {
                Vec::new()
            } else {
                merge_timelines(&st.timelines)
            };
            (
                objects,
                st.invalidations,
                fresh,
                std::mem::take(&mut st.cache),
            )
        };

        let stage = if snapshot_fresh {
            Ok(false)
        } else {
            self.refresh_snapshot(&objects, now, generation, &mut cache)
                .await
        };
        // The cache goes back whatever happened
        self.state.lock().cache = cache;

        if stage? {
            tracing::debug!(session = %self.id, "in-flight resolve discarded after invalidation");
            return Ok(Some(self.now_ms()));
        }

        // Instant-state derivation: exact wakeup at the next event, never
        // polling
        let mut st = self.state.lock();
        let mut next_wake = None;
        if st.state_valid_until.map_or(true, |t| t <= now) {
            if let Some(snapshot) = st.snapshot.clone() {
                st.instant = Some(self.primitive.state_at(&snapshot, now));
                let next_event = snapshot.next_event_after(now);
                st.state_valid_until = Some(next_event.unwrap_or(u64::MAX));
                next_wake = next_event;
            }
        }
        Ok(next_wake)
    }

    /// Run both heavy primitive stages and publish the snapshot.
    ///
    /// Returns `Ok(true)` when an invalidation landed during one of the
    /// voluntary yields and the result was discarded unpublished.
    async fn refresh_snapshot(
        &self,
        objects: &[CompiledTimelineObject],
        now: u64,
        generation: u64,
        cache: &mut P::Cache,
    ) -> Result<bool, ResolveError> {
        let limit_time = now + RESOLVE_LOOKAHEAD.as_millis() as u64;
        let resolved = self
            .primitive
            .resolve_timeline(objects, now, limit_time, cache)?;
        tokio::task::yield_now().await;
        if self.invalidated_since(generation) {
            return Ok(true);
        }

        let states = self.primitive.resolve_all_states(&resolved, cache)?;
        tokio::task::yield_now().await;
        if self.invalidated_since(generation) {
            return Ok(true);
        }

        let mut st = self.state.lock();
        st.snapshot = Some(Arc::new(states));
        st.snapshot_valid_until = Some(limit_time);
        // Force the instant state to be re-derived from the new snapshot
        st.state_valid_until = None;
        Ok(false)
    }
}

/// Flatten every stored per-group timeline, in map order, into one list
fn merge_timelines(
    timelines: &IndexMap<String, Vec<CompiledTimelineObject>>,
) -> Vec<CompiledTimelineObject> {
    timelines.values().flatten().cloned().collect()
}

/// The timer loop: waits for the pending trigger, fires the resolve, and
/// re-waits. Re-arming to an earlier time interrupts the current sleep.
async fn run_loop<P: ResolvePrimitive>(inner: Arc<Inner<P>>) {
    loop {
        let due = {
            let st = inner.state.lock();
            match st.phase {
                ResolvePhase::Scheduled { at_ms } => Some(at_ms),
                _ => None,
            }
        };
        let Some(at_ms) = due else {
            inner.wake.notified().await;
            continue;
        };

        let deadline = inner.epoch + Duration::from_millis(at_ms);
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {
                let fire = {
                    let mut st = inner.state.lock();
                    if st.phase == (ResolvePhase::Scheduled { at_ms }) {
                        st.phase = ResolvePhase::Idle;
                        true
                    } else {
                        false
                    }
                };
                if fire {
                    inner.resolve_once().await;
                }
            }
            () = inner.wake.notified() => {
                // Trigger re-armed; recompute the deadline
            }
        }
    }
}
