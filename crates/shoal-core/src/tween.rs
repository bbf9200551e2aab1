//! Pooled, interruptible tweens advanced by one shared frame scheduler.
//!
//! A [`TweenEngine`] owns every tween slot. Callers hold [`TweenId`]
//! handles, which go stale once the tween is returned to the pool, so a
//! reissued slot can never be driven through an old handle.
//!
//! The engine is generic over the context `C` handed to update callbacks.
//! Callbacks receive `&mut C` and the eased progress, which lets them mutate
//! state owned elsewhere without the engine holding references to it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::easing::Easing;

type UpdateFn<C> = Box<dyn FnMut(&mut C, f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TweenError {
    #[error("tween handle {0:?} is stale (returned to the pool)")]
    Stale(TweenId),
}

/// How a tween's completion settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Progress reached 1.
    Finished,
    /// [`TweenEngine::stop`] cut it short.
    Stopped,
}

/// Single-resolution completion signal returned by
/// [`TweenEngine::start`] and [`TweenEngine::reverse`].
#[derive(Debug, Clone, Default)]
pub struct Completion {
    state: Rc<Cell<Option<Settled>>>,
}

impl Completion {
    pub fn poll(&self) -> Option<Settled> {
        self.state.get()
    }

    pub fn is_settled(&self) -> bool {
        self.state.get().is_some()
    }

    fn resolve(&self, how: Settled) {
        if self.state.get().is_none() {
            self.state.set(Some(how));
        }
    }
}

struct TweenSlot<C: ?Sized> {
    generation: u32,
    duration: Duration,
    ease: Easing,
    on_update: Option<UpdateFn<C>>,
    started_at: Instant,
    reverse: bool,
    pending: Option<Completion>,
}

impl<C: ?Sized> TweenSlot<C> {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn apply(&mut self, ctx: &mut C, progress: f64) {
        let sample = if self.reverse { 1.0 - progress } else { progress };
        let value = self.ease.apply(sample);
        if let Some(update) = self.on_update.as_mut() {
            update(ctx, value);
        }
    }
}

pub struct TweenEngine<C: ?Sized> {
    slots: Vec<TweenSlot<C>>,
    free: Vec<usize>,
    active: Vec<usize>,
}

impl<C: ?Sized> Default for TweenEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> TweenEngine<C> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Check out a tween with an update callback.
    pub fn get(
        &mut self,
        duration: Duration,
        on_update: impl FnMut(&mut C, f64) + 'static,
        ease: Easing,
    ) -> TweenId {
        let id = self.acquire(duration, ease);
        self.slots[id.index].on_update = Some(Box::new(on_update));
        id
    }

    /// Check out a tween with no update callback. Pooled slots come back
    /// fully reset.
    pub fn acquire(&mut self, duration: Duration, ease: Easing) -> TweenId {
        let now = Instant::now();
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.duration = duration;
                slot.ease = ease;
                slot.started_at = now;
                slot.reverse = false;
                index
            }
            None => {
                self.slots.push(TweenSlot {
                    generation: 0,
                    duration,
                    ease,
                    on_update: None,
                    started_at: now,
                    reverse: false,
                    pending: None,
                });
                self.slots.len() - 1
            }
        };
        TweenId {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Begin running forward from `now`.
    pub fn start(&mut self, id: TweenId, now: Instant) -> Result<Completion, TweenError> {
        self.launch(id, now, false)
    }

    /// Like [`start`](Self::start) but samples `ease(1 - progress)`.
    pub fn reverse(&mut self, id: TweenId, now: Instant) -> Result<Completion, TweenError> {
        self.launch(id, now, true)
    }

    /// Run forward, or in reverse, from the value the tween shows right
    /// now, so turning it around mid-flight does not jump. A tween that is
    /// not running starts from its beginning.
    pub fn redirect(&mut self, id: TweenId, now: Instant, reverse: bool) -> Result<Completion, TweenError> {
        self.check(id)?;
        let progress = if self.active.contains(&id.index) {
            let slot = &self.slots[id.index];
            let p = slot.progress(now);
            let sample = if slot.reverse { 1.0 - p } else { p };
            if reverse {
                1.0 - sample
            } else {
                sample
            }
        } else {
            0.0
        };
        let completion = self.launch(id, now, reverse)?;
        let slot = &mut self.slots[id.index];
        slot.started_at = now
            .checked_sub(slot.duration.mul_f64(progress))
            .unwrap_or(now);
        Ok(completion)
    }

    /// Resolve the pending completion early and leave the active set.
    ///
    /// Idempotent, and a no-op for stale handles.
    pub fn stop(&mut self, id: TweenId) {
        if self.check(id).is_ok() {
            self.settle(id.index, Settled::Stopped);
        }
    }

    /// Apply the final value immediately, then settle as finished.
    pub fn end_instantly(&mut self, id: TweenId, ctx: &mut C) -> Result<(), TweenError> {
        self.check(id)?;
        let slot = &mut self.slots[id.index];
        slot.apply(ctx, 1.0);
        self.settle(id.index, Settled::Finished);
        Ok(())
    }

    /// Kill the tween and put its slot back in the pool. The handle goes
    /// stale and the slot forgets its callback, easing and completion.
    pub fn return_tween(&mut self, id: TweenId) {
        if self.check(id).is_err() {
            return;
        }
        self.deactivate(id.index);
        let slot = &mut self.slots[id.index];
        slot.on_update = None;
        slot.ease = Easing::Linear;
        slot.pending = None;
        slot.reverse = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Advance every active tween to `now`.
    pub fn tick(&mut self, now: Instant, ctx: &mut C) {
        if self.active.is_empty() {
            return;
        }
        let running = self.active.clone();
        for index in running {
            if !self.active.contains(&index) {
                continue;
            }
            let slot = &mut self.slots[index];
            let progress = slot.progress(now);
            slot.apply(ctx, progress);
            if progress >= 1.0 {
                self.settle(index, Settled::Finished);
            }
        }
    }

    pub fn has_update(&self, id: TweenId) -> bool {
        self.check(id).is_ok() && self.slots[id.index].on_update.is_some()
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.check(id).is_ok() && self.active.contains(&id.index)
    }

    /// `false` once the last active tween settles; ticking is then a no-op.
    pub fn is_running(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Slots waiting in the pool for reuse.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    fn launch(&mut self, id: TweenId, now: Instant, reverse: bool) -> Result<Completion, TweenError> {
        self.check(id)?;
        let slot = &mut self.slots[id.index];
        if let Some(previous) = slot.pending.take() {
            previous.resolve(Settled::Stopped);
        }
        let completion = Completion::default();
        slot.pending = Some(completion.clone());
        slot.started_at = now;
        slot.reverse = reverse;
        if !self.active.contains(&id.index) {
            if self.active.is_empty() {
                tracing::trace!("tween scheduler started");
            }
            self.active.push(id.index);
        }
        Ok(completion)
    }

    fn settle(&mut self, index: usize, how: Settled) {
        self.deactivate(index);
        if let Some(completion) = self.slots[index].pending.take() {
            completion.resolve(how);
        }
    }

    fn deactivate(&mut self, index: usize) {
        let before = self.active.len();
        self.active.retain(|&i| i != index);
        if before != self.active.len() && self.active.is_empty() {
            tracing::trace!("tween scheduler idle");
        }
    }

    fn check(&self, id: TweenId) -> Result<(), TweenError> {
        match self.slots.get(id.index) {
            Some(slot) if slot.generation == id.generation => Ok(()),
            _ => Err(TweenError::Stale(id)),
        }
    }
}
