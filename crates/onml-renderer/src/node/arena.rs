use super::types::{HostNode, InstanceId, ParentId};
use std::collections::HashMap;

/// Hands out instance ids. Ids only ever grow, so a disposed node's id is
/// never seen again.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn allocate(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next += 1;
        id
    }

    /// Id the next allocation will return
    pub fn peek(&self) -> InstanceId {
        InstanceId(self.next)
    }
}

/// Storage for every live host node, keyed by id, plus the parent each node
/// is currently attached to.
pub struct InstanceArena {
    nodes: HashMap<InstanceId, HostNode>,
    parents: HashMap<InstanceId, ParentId>,
}

impl InstanceArena {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    /// Insert a detached node. Replaces any node stored under the same id.
    pub fn insert(&mut self, node: HostNode) -> InstanceId {
        let id = node.id();
        self.nodes.insert(id, node);
        self.parents.remove(&id);
        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&HostNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut HostNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn set_parent(&mut self, node: InstanceId, parent: Option<ParentId>) {
        match parent {
            Some(parent) => {
                self.parents.insert(node, parent);
            }
            None => {
                self.parents.remove(&node);
            }
        }
    }

    pub fn get_parent(&self, node: InstanceId) -> Option<&ParentId> {
        self.parents.get(&node)
    }

    pub fn children(&self, id: InstanceId) -> Vec<InstanceId> {
        self.get(id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }

    /// Drop a node and everything below it. Returns how many nodes went away.
    pub fn dispose(&mut self, id: InstanceId) -> usize {
        let mut stack = vec![id];
        let mut disposed = 0;

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                self.parents.remove(&current);
                stack.extend(node.children().iter().copied());
                disposed += 1;
            }
        }

        disposed
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for InstanceArena {
    fn default() -> Self {
        Self::new()
    }
}
