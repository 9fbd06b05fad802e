use crate::element::Node;
use crate::error::Result;
use crate::host_config::HostContext;
use crate::node::RootId;

/// Runs once the update it was attached to has been committed
pub type RenderCallback = Box<dyn FnOnce()>;

/// Handle to a root created by [`Reconciler::create_container`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootHandle {
    root_id: RootId,
}

impl RootHandle {
    pub fn new(root_id: RootId) -> Self {
        Self { root_id }
    }

    pub fn root_id(&self) -> &RootId {
        &self.root_id
    }
}

/// The reconciliation engine driving a host.
pub trait Reconciler {
    fn create_container(&mut self, root_id: &RootId) -> RootHandle;

    /// Queue `element` as the new content of `root`. `None` unmounts every
    /// child of the root but keeps the root itself.
    fn update_container(
        &mut self,
        element: Option<Node>,
        root: &RootHandle,
        context: Option<HostContext>,
        callback: Option<RenderCallback>,
    ) -> Result<()>;

    /// Collect every update made inside `f` and commit them once, when the
    /// outermost batch returns.
    fn batched_updates<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R>
    where
        Self: Sized;

    fn unbatched_updates<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R>
    where
        Self: Sized;

    /// Like [`Reconciler::unbatched_updates`], with every update committed
    /// synchronously whatever the current priority.
    fn sync_updates<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R>
    where
        Self: Sized;
}
