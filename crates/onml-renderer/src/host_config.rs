use crate::builder;
use crate::element::Props;
use crate::error::{HostError, Result};
use crate::node::{HostNode, InstanceId, ParentId, RootId, TextInstance, UpdatePayload};
use crate::renderer::TreeRenderer;
use crate::scheduler::{AnimationCallback, DeferredCallback};
use smartstring::alias::String as SmartString;

/// Context handed down while building host nodes. The in-memory host has
/// nothing to share, so every context is the same.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostContext;

/// Host-config surface
///
/// Everything a reconciler needs from a host to build and mutate its tree.
/// Nodes created here start detached; they only become part of a root once
/// appended to it or to something already attached.
pub trait HostConfig {
    fn get_root_host_context(&self, root_id: &RootId) -> HostContext;

    fn get_child_host_context(&self, parent: &HostContext, kind: &str) -> HostContext;

    fn get_public_instance(&self, id: InstanceId) -> Option<&HostNode>;

    fn create_instance(
        &mut self,
        kind: &str,
        props: &Props,
        root_id: &RootId,
        context: &HostContext,
    ) -> InstanceId;

    fn append_initial_child(&mut self, parent: InstanceId, child: InstanceId) -> Result<()>;

    /// Whether the instance wants a `commit_mount` call once attached
    fn finalize_initial_children(&mut self, id: InstanceId, kind: &str, props: &Props)
    -> Result<bool>;

    fn prepare_update(&self, id: InstanceId, props: &Props) -> Result<Option<UpdatePayload>>;

    fn commit_mount(&mut self, id: InstanceId, kind: &str, props: &Props) -> Result<()>;

    fn commit_update(&mut self, id: InstanceId, payload: UpdatePayload) -> Result<()>;

    fn should_set_text_content(&self, props: &Props) -> bool;

    fn reset_text_content(&mut self, id: InstanceId) -> Result<()>;

    fn should_deprioritize_subtree(&self, kind: &str, props: &Props) -> bool;

    fn create_text_instance(
        &mut self,
        text: &str,
        root_id: &RootId,
        context: &HostContext,
    ) -> InstanceId;

    fn commit_text_update(&mut self, id: InstanceId, text: &str) -> Result<()>;

    fn append_child(&mut self, parent: &ParentId, child: InstanceId) -> Result<()>;

    fn insert_before(
        &mut self,
        parent: &ParentId,
        child: InstanceId,
        before: InstanceId,
    ) -> Result<()>;

    fn remove_child(&mut self, parent: &ParentId, child: InstanceId) -> Result<()>;

    fn schedule_animation_callback(&mut self, callback: AnimationCallback<Self>) -> Result<()>
    where
        Self: Sized;

    fn schedule_deferred_callback(&mut self, callback: DeferredCallback<Self>) -> Result<()>
    where
        Self: Sized;

    fn prepare_for_commit(&mut self) -> Result<()>;

    /// Returns how many nodes were disposed
    fn reset_after_commit(&mut self) -> usize;
}

impl HostConfig for TreeRenderer {
    fn get_root_host_context(&self, _root_id: &RootId) -> HostContext {
        HostContext
    }

    fn get_child_host_context(&self, parent: &HostContext, _kind: &str) -> HostContext {
        *parent
    }

    fn get_public_instance(&self, id: InstanceId) -> Option<&HostNode> {
        self.tree.node(id)
    }

    fn create_instance(
        &mut self,
        kind: &str,
        props: &Props,
        _root_id: &RootId,
        _context: &HostContext,
    ) -> InstanceId {
        let instance =
            builder::create_instance(&mut self.ids, kind, props, self.config.retain_attributes);
        self.tree.insert(HostNode::Instance(instance))
    }

    fn append_initial_child(&mut self, parent: InstanceId, child: InstanceId) -> Result<()> {
        self.tree.append_child(&ParentId::Instance(parent), child)
    }

    fn finalize_initial_children(
        &mut self,
        id: InstanceId,
        kind: &str,
        props: &Props,
    ) -> Result<bool> {
        let instance = self.instance(id)?;
        Ok(builder::finalize_initial_children(instance, kind, props))
    }

    fn prepare_update(&self, id: InstanceId, props: &Props) -> Result<Option<UpdatePayload>> {
        let instance = self.instance(id)?;
        Ok(builder::prepare_update(
            instance,
            props,
            self.config.retain_attributes,
        ))
    }

    fn commit_mount(&mut self, id: InstanceId, _kind: &str, _props: &Props) -> Result<()> {
        self.instance(id).map(|_| ())
    }

    fn commit_update(&mut self, id: InstanceId, payload: UpdatePayload) -> Result<()> {
        self.tree.update_props(id, payload)
    }

    fn should_set_text_content(&self, props: &Props) -> bool {
        builder::should_set_text_content(props)
    }

    fn reset_text_content(&mut self, id: InstanceId) -> Result<()> {
        self.instance(id).map(|_| ())
    }

    fn should_deprioritize_subtree(&self, kind: &str, props: &Props) -> bool {
        builder::should_deprioritize_subtree(kind, props)
    }

    fn create_text_instance(
        &mut self,
        text: &str,
        _root_id: &RootId,
        _context: &HostContext,
    ) -> InstanceId {
        let text: TextInstance = builder::create_text_instance(&mut self.ids, text);
        self.tree.insert(HostNode::Text(text))
    }

    fn commit_text_update(&mut self, id: InstanceId, text: &str) -> Result<()> {
        self.tree.update_text(id, SmartString::from(text))
    }

    fn append_child(&mut self, parent: &ParentId, child: InstanceId) -> Result<()> {
        self.tree.append_child(parent, child)
    }

    fn insert_before(
        &mut self,
        parent: &ParentId,
        child: InstanceId,
        before: InstanceId,
    ) -> Result<()> {
        self.tree.insert_before(parent, child, before)
    }

    fn remove_child(&mut self, parent: &ParentId, child: InstanceId) -> Result<()> {
        self.tree.remove_child(parent, child)
    }

    fn schedule_animation_callback(&mut self, callback: AnimationCallback<Self>) -> Result<()> {
        self.scheduler.schedule_animation(callback)
    }

    fn schedule_deferred_callback(&mut self, callback: DeferredCallback<Self>) -> Result<()> {
        self.scheduler.schedule_deferred(callback)
    }

    fn prepare_for_commit(&mut self) -> Result<()> {
        tracing::trace!("Preparing commit");
        Ok(())
    }

    fn reset_after_commit(&mut self) -> usize {
        let disposed = self.tree.sweep_detached();
        if disposed > 0 {
            tracing::trace!(disposed, "Disposed detached nodes");
        }
        disposed
    }
}

impl TreeRenderer {
    fn instance(&self, id: InstanceId) -> Result<&crate::node::Instance> {
        match self.tree.node(id) {
            Some(HostNode::Instance(instance)) => Ok(instance),
            Some(HostNode::Text(_)) => Err(HostError::UnexpectedNodeKind {
                id,
                expected: "an instance",
            }),
            None => Err(HostError::UnknownInstance(id)),
        }
    }
}
