mod deadline;

use crate::error::{HostError, Result};
use std::fmt;

pub use deadline::Deadline;

/// How urgently an update has to reach the host tree. Ordered from most to
/// least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Sync,
    Animation,
    Deferred,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Sync => f.write_str("sync"),
            Priority::Animation => f.write_str("animation"),
            Priority::Deferred => f.write_str("deferred"),
        }
    }
}

/// Work to run on the next animation flush
pub type AnimationCallback<C> = Box<dyn FnOnce(&mut C) -> Result<()>>;

/// Work to run on the next deferred flush, within the given deadline
pub type DeferredCallback<C> = Box<dyn FnOnce(&mut C, &mut Deadline) -> Result<()>>;

/// Single-slot mailbox per priority.
///
/// At most one animation and one deferred callback can be pending. Nothing
/// runs when scheduled; the owner takes a callback out of its slot on flush
/// and invokes it with its own context, which leaves the slot free for the
/// callback to schedule a successor.
pub struct Scheduler<C> {
    animation: Option<AnimationCallback<C>>,
    deferred: Option<DeferredCallback<C>>,
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            animation: None,
            deferred: None,
        }
    }

    pub fn schedule_animation(&mut self, callback: AnimationCallback<C>) -> Result<()> {
        if self.animation.is_some() {
            return Err(HostError::DoubleScheduling(Priority::Animation));
        }
        tracing::trace!("Scheduled animation callback");
        self.animation = Some(callback);
        Ok(())
    }

    pub fn schedule_deferred(&mut self, callback: DeferredCallback<C>) -> Result<()> {
        if self.deferred.is_some() {
            return Err(HostError::DoubleScheduling(Priority::Deferred));
        }
        tracing::trace!("Scheduled deferred callback");
        self.deferred = Some(callback);
        Ok(())
    }

    /// Empty the animation slot
    pub fn take_animation(&mut self) -> Option<AnimationCallback<C>> {
        self.animation.take()
    }

    /// Empty the deferred slot
    pub fn take_deferred(&mut self) -> Option<DeferredCallback<C>> {
        self.deferred.take()
    }

    pub fn has_animation(&self) -> bool {
        self.animation.is_some()
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.has_animation() || self.has_deferred()
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("animation", &self.has_animation())
            .field("deferred", &self.has_deferred())
            .finish()
    }
}
