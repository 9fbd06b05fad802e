use crate::node::{Container, RootId};
use std::collections::HashMap;

/// Every registered root name and its container.
///
/// Starts empty. The coordinator adds an entry on the first render to a
/// root name and removes it once that root has been unmounted.
#[derive(Debug, Default)]
pub struct RootRegistry {
    containers: HashMap<RootId, Container>,
}

impl RootRegistry {
    pub fn new() -> Self {
        Self {
            containers: HashMap::new(),
        }
    }

    /// Register a root, creating an empty container on first use.
    /// Returns true when the root was not registered before.
    pub fn register(&mut self, root_id: &RootId) -> bool {
        if self.containers.contains_key(root_id) {
            return false;
        }
        self.containers
            .insert(root_id.clone(), Container::new(root_id.clone()));
        true
    }

    pub fn unregister(&mut self, root_id: &RootId) -> Option<Container> {
        self.containers.remove(root_id)
    }

    pub fn get(&self, root_id: &str) -> Option<&Container> {
        self.containers.get(root_id)
    }

    pub fn get_mut(&mut self, root_id: &str) -> Option<&mut Container> {
        self.containers.get_mut(root_id)
    }

    pub fn contains(&self, root_id: &str) -> bool {
        self.containers.contains_key(root_id)
    }

    /// Registered root names, sorted
    pub fn root_ids(&self) -> Vec<RootId> {
        let mut ids: Vec<RootId> = self.containers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
