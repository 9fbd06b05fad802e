//! Render coordinator.
//!
//! `TreeRenderer` owns the host tree and every root rendered into it. Each
//! root goes Unmounted -> Mounted on its first render and back to
//! Unmounted once an unmount has been committed. Updates are queued per
//! root, coalesced, and committed either right away (sync priority) or by
//! work callbacks that only run when the caller flushes.

use crate::commit::{HostTree, apply_mutations};
use crate::config::RendererConfig;
use crate::diff::{self, DiffOptions};
use crate::element::Node;
use crate::error::{HostError, Result};
use crate::host_config::{HostConfig, HostContext};
use crate::node::{HostNode, HostSnapshot, IdAllocator, ParentId, RootId};
use crate::reconciler::{Reconciler, RenderCallback, RootHandle};
use crate::scheduler::{Deadline, Priority, Scheduler};
use std::fmt;

/// Running totals since the renderer was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub commits: usize,
    pub mutations: usize,
    pub disposed: usize,
}

struct PendingUpdate {
    root: RootId,
    element: Option<Node>,
    /// Drop the root once this update is committed
    unmount: bool,
    callbacks: Vec<RenderCallback>,
    priority: Priority,
}

pub struct TreeRenderer {
    pub(crate) config: RendererConfig,
    pub(crate) tree: HostTree,
    pub(crate) ids: IdAllocator,
    pub(crate) scheduler: Scheduler<TreeRenderer>,
    pending: Vec<PendingUpdate>,
    /// Queues of enclosing batches, set aside while unbatched work runs
    suspended: Vec<Vec<PendingUpdate>>,
    batch_depth: usize,
    priority_override: Option<Priority>,
    fail_in_begin_phase: bool,
    animation_work_scheduled: bool,
    deferred_work_scheduled: bool,
    stats: RenderStats,
}

impl TreeRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            tree: HostTree::new(),
            ids: IdAllocator::new(),
            scheduler: Scheduler::new(),
            pending: Vec::new(),
            suspended: Vec::new(),
            batch_depth: 0,
            priority_override: None,
            fail_in_begin_phase: false,
            animation_work_scheduled: false,
            deferred_work_scheduled: false,
            stats: RenderStats::default(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn host_tree(&self) -> &HostTree {
        &self.tree
    }

    /// Render into the default root
    pub fn render(
        &mut self,
        element: impl Into<Node>,
        callback: Option<RenderCallback>,
    ) -> Result<()> {
        let root_id = self.config.default_root_id.clone();
        self.render_to_root_with_id(element, &root_id, callback)
    }

    pub fn render_to_root_with_id(
        &mut self,
        element: impl Into<Node>,
        root_id: &str,
        callback: Option<RenderCallback>,
    ) -> Result<()> {
        let root_id = RootId::from(root_id);
        let root = if self.tree.roots().contains(&root_id) {
            RootHandle::new(root_id)
        } else {
            self.create_container(&root_id)
        };
        self.update_container(Some(element.into()), &root, None, callback)
    }

    /// Tear down everything under `root_id` and forget the root. Unknown
    /// roots are ignored.
    pub fn unmount_root_with_id(&mut self, root_id: &str) -> Result<()> {
        if !self.tree.roots().contains(root_id) {
            return Ok(());
        }
        self.enqueue(RootId::from(root_id), None, true, None)
    }

    pub fn is_mounted(&self, root_id: &str) -> bool {
        self.tree.roots().contains(root_id)
    }

    /// Committed children of a root, `None` if it is not mounted
    pub fn get_children(&self, root_id: &str) -> Option<Vec<HostSnapshot>> {
        match self.tree.snapshot_root(root_id)? {
            Ok(children) => Some(children),
            Err(err) => {
                tracing::warn!(root = root_id, error = %err, "Host tree is inconsistent");
                None
            }
        }
    }

    /// Components own no host instance, so there is never one to find
    pub fn find_instance(&self, _node: &Node) -> Option<&HostNode> {
        None
    }

    /// Run pending animation work, then pending deferred work without a
    /// time limit.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_animation_pri()?;
        self.flush_deferred_pri(None)
    }

    pub fn flush_animation_pri(&mut self) -> Result<()> {
        let Some(callback) = self.scheduler.take_animation() else {
            return Ok(());
        };
        tracing::trace!("Flushing animation callback");
        callback(self)
    }

    /// Run the deferred callback with a budget of `timeout`, unbounded when
    /// `None`. `Some(0)` is an empty budget, not an unbounded one.
    pub fn flush_deferred_pri(&mut self, timeout: Option<u64>) -> Result<()> {
        let Some(callback) = self.scheduler.take_deferred() else {
            return Ok(());
        };
        tracing::trace!(?timeout, "Flushing deferred callback");
        let mut deadline = Deadline::new(timeout, self.config.deadline_step);
        callback(self, &mut deadline)
    }

    /// Updates made inside `f` get animation priority
    pub fn perform_animation_work<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let previous = self.priority_override.replace(Priority::Animation);
        let result = f(self);
        self.priority_override = previous;
        result
    }

    /// Every commit attempted inside `f` fails before touching the tree
    pub fn simulate_error_in_host_config<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.fail_in_begin_phase = true;
        let result = f(self);
        self.fail_in_begin_phase = false;
        result
    }

    /// Indented rendering of a root's committed tree
    pub fn dump_tree(&self, root_id: &str) -> Option<String> {
        let children = self.get_children(root_id)?;
        let mut out = format!("{}\n", root_id);
        for child in &children {
            child.write_tree(&mut out, 1);
        }
        tracing::debug!("Host tree:\n{}", out);
        Some(out)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Whether any update is still waiting for a flush
    pub fn has_pending_work(&self) -> bool {
        !self.pending.is_empty() || self.suspended.iter().any(|queue| !queue.is_empty())
    }

    fn current_priority(&self) -> Priority {
        self.priority_override.unwrap_or(if self.config.use_sync_scheduling {
            Priority::Sync
        } else {
            Priority::Deferred
        })
    }

    /// Queue an update, merging it into any update already queued for the
    /// same root.
    fn enqueue(
        &mut self,
        root: RootId,
        element: Option<Node>,
        unmount: bool,
        callback: Option<RenderCallback>,
    ) -> Result<()> {
        let priority = self.current_priority();
        tracing::debug!(root = %root, %priority, unmount, "Scheduling update");

        // An enclosing batch's update for this root is superseded by this one
        let mut earlier = Vec::new();
        for queue in &mut self.suspended {
            if let Some(index) = queue.iter().position(|update| update.root == root) {
                earlier.push(queue.remove(index));
            }
        }
        for update in earlier {
            self.merge(update);
        }

        self.merge(PendingUpdate {
            root,
            element,
            unmount,
            callbacks: callback.into_iter().collect(),
            priority,
        });

        if self.batch_depth > 0 {
            return Ok(());
        }
        self.process_queue()
    }

    /// Fold `update` into the queued update for the same root. The newer
    /// tree wins and callbacks keep their order.
    fn merge(&mut self, update: PendingUpdate) {
        match self.pending.iter_mut().find(|queued| queued.root == update.root) {
            Some(queued) => {
                queued.element = update.element;
                queued.unmount = update.unmount;
                queued.priority = queued.priority.min(update.priority);
                queued.callbacks.extend(update.callbacks);
            }
            None => self.pending.push(update),
        }
    }

    /// Commit what has to be synchronous and schedule work for the rest
    fn process_queue(&mut self) -> Result<()> {
        self.commit_pending(|priority| priority == Priority::Sync)?;
        self.schedule_work()
    }

    fn schedule_work(&mut self) -> Result<()> {
        let needs_animation = self
            .pending
            .iter()
            .any(|update| update.priority <= Priority::Animation);
        if needs_animation && !self.animation_work_scheduled {
            self.schedule_animation_callback(Box::new(TreeRenderer::animation_work))?;
            self.animation_work_scheduled = true;
        }

        let needs_deferred = self
            .pending
            .iter()
            .any(|update| update.priority == Priority::Deferred);
        if needs_deferred && !self.deferred_work_scheduled {
            self.schedule_deferred_callback(Box::new(TreeRenderer::deferred_work))?;
            self.deferred_work_scheduled = true;
        }

        Ok(())
    }

    fn animation_work(&mut self) -> Result<()> {
        self.animation_work_scheduled = false;
        self.commit_pending(|priority| priority <= Priority::Animation)?;
        self.schedule_work()
    }

    fn deferred_work(&mut self, deadline: &mut Deadline) -> Result<()> {
        self.deferred_work_scheduled = false;
        while !self.pending.is_empty() && deadline.time_remaining() > 0.0 {
            let update = self.pending.remove(0);
            self.commit_update(update)?;
        }
        if !self.pending.is_empty() {
            tracing::trace!(remaining = self.pending.len(), "Deadline expired");
        }
        self.schedule_work()
    }

    fn commit_pending(&mut self, ready: impl Fn(Priority) -> bool) -> Result<()> {
        while let Some(index) = self.pending.iter().position(|update| ready(update.priority)) {
            let update = self.pending.remove(index);
            self.commit_update(update)?;
        }
        Ok(())
    }

    fn commit_update(&mut self, update: PendingUpdate) -> Result<()> {
        let PendingUpdate {
            root,
            element,
            unmount,
            callbacks,
            ..
        } = update;

        if self.fail_in_begin_phase {
            return Err(HostError::SimulatedFailure);
        }

        let parent = ParentId::Container(root.clone());
        let old_children = self.tree.children(&parent)?.to_vec();
        let result = diff::diff(
            self.tree.arena(),
            &mut self.ids,
            parent,
            &old_children,
            element.as_ref(),
            DiffOptions {
                retain_attributes: self.config.retain_attributes,
            },
        )?;
        if result.deprioritized > 0 {
            tracing::debug!(root = %root, count = result.deprioritized, "Hidden sub-trees mounted");
        }

        self.prepare_for_commit()?;
        let summary = apply_mutations(&mut self.tree, result.ops)?;
        let mut disposed = summary.disposed + self.reset_after_commit();

        if unmount {
            disposed += self.tree.unregister_root(&root);
            tracing::debug!(root = %root, "Removed container");
        }

        self.stats.commits += 1;
        self.stats.mutations += summary.applied;
        self.stats.disposed += disposed;
        tracing::debug!(
            root = %root,
            mutations = summary.applied,
            disposed,
            "Committed root"
        );

        for callback in callbacks {
            callback();
        }
        Ok(())
    }
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

impl fmt::Debug for TreeRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeRenderer")
            .field("roots", &self.tree.roots().root_ids())
            .field("pending", &self.pending.len())
            .field("scheduler", &self.scheduler)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Reconciler for TreeRenderer {
    fn create_container(&mut self, root_id: &RootId) -> RootHandle {
        if self.tree.roots_mut().register(root_id) {
            tracing::debug!(root = %root_id, "Created container");
        }
        RootHandle::new(root_id.clone())
    }

    fn update_container(
        &mut self,
        element: Option<Node>,
        root: &RootHandle,
        _context: Option<HostContext>,
        callback: Option<RenderCallback>,
    ) -> Result<()> {
        if !self.tree.roots().contains(root.root_id()) {
            return Err(HostError::UnknownRoot(root.root_id().clone()));
        }
        self.enqueue(root.root_id().clone(), element, false, callback)
    }

    fn batched_updates<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;

        if self.batch_depth == 0 {
            tracing::debug!(updates = self.pending.len(), "Flushing batch");
            self.process_queue()?;
        }
        result
    }

    fn unbatched_updates<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let depth = std::mem::take(&mut self.batch_depth);
        let outer = std::mem::take(&mut self.pending);
        self.suspended.push(outer);

        let result = f(self);

        let outer = self.suspended.pop().unwrap_or_default();
        let leftover = std::mem::replace(&mut self.pending, outer);
        for update in leftover {
            self.merge(update);
        }
        self.batch_depth = depth;
        result
    }

    fn sync_updates<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let previous = self.priority_override.replace(Priority::Sync);
        let result = self.unbatched_updates(f);
        self.priority_override = previous;
        result
    }
}
