//! Commit phase: applies mutation ops to the live host tree.

use crate::error::{HostError, Result};
use crate::node::{
    ChildList, HostNode, HostSnapshot, InstanceArena, InstanceId, MutationOp, ParentId, RootId,
    UpdatePayload,
};
use crate::registry::RootRegistry;
use smartstring::alias::String as SmartString;

/// The live tree: every host node plus the root containers holding them.
#[derive(Default)]
pub struct HostTree {
    arena: InstanceArena,
    roots: RootRegistry,
    /// Removed during the current commit and not yet disposed
    detached: Vec<InstanceId>,
}

/// What one commit did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub applied: usize,
    pub disposed: usize,
}

impl HostTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arena(&self) -> &InstanceArena {
        &self.arena
    }

    pub fn roots(&self) -> &RootRegistry {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut RootRegistry {
        &mut self.roots
    }

    /// Store a node that is not attached anywhere yet
    pub fn insert(&mut self, node: HostNode) -> InstanceId {
        self.arena.insert(node)
    }

    pub fn node(&self, id: InstanceId) -> Option<&HostNode> {
        self.arena.get(id)
    }

    pub fn children(&self, parent: &ParentId) -> Result<&[InstanceId]> {
        match parent {
            ParentId::Container(root) => self
                .roots
                .get(root)
                .map(|c| c.children.as_slice())
                .ok_or_else(|| HostError::UnknownRoot(root.clone())),
            ParentId::Instance(id) => match self.arena.get(*id) {
                Some(HostNode::Instance(instance)) => Ok(instance.children.as_slice()),
                Some(HostNode::Text(_)) => Err(HostError::UnexpectedNodeKind {
                    id: *id,
                    expected: "an instance",
                }),
                None => Err(HostError::UnknownInstance(*id)),
            },
        }
    }

    fn children_mut(&mut self, parent: &ParentId) -> Result<&mut ChildList> {
        match parent {
            ParentId::Container(root) => self
                .roots
                .get_mut(root)
                .map(|c| &mut c.children)
                .ok_or_else(|| HostError::UnknownRoot(root.clone())),
            ParentId::Instance(id) => match self.arena.get_mut(*id) {
                Some(HostNode::Instance(instance)) => Ok(&mut instance.children),
                Some(HostNode::Text(_)) => Err(HostError::UnexpectedNodeKind {
                    id: *id,
                    expected: "an instance",
                }),
                None => Err(HostError::UnknownInstance(*id)),
            },
        }
    }

    /// Unhook a node from whichever parent currently holds it
    fn detach(&mut self, child: InstanceId) -> Result<()> {
        let Some(parent) = self.arena.get_parent(child).cloned() else {
            return Ok(());
        };
        let children = self.children_mut(&parent)?;
        if let Some(index) = children.iter().position(|&c| c == child) {
            children.remove(index);
        }
        self.arena.set_parent(child, None);
        Ok(())
    }

    fn ensure_node(&self, id: InstanceId) -> Result<()> {
        if self.arena.contains(id) {
            Ok(())
        } else {
            Err(HostError::UnknownInstance(id))
        }
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: &ParentId, child: InstanceId) -> Result<()> {
        self.ensure_node(child)?;
        self.children(parent)?;
        self.detach(child)?;
        self.children_mut(parent)?.push(child);
        self.arena.set_parent(child, Some(parent.clone()));
        Ok(())
    }

    /// Move `child` right in front of `before`.
    pub fn insert_before(
        &mut self,
        parent: &ParentId,
        child: InstanceId,
        before: InstanceId,
    ) -> Result<()> {
        self.ensure_node(child)?;
        self.children(parent)?;
        self.detach(child)?;

        let position = self.children(parent)?.iter().position(|&c| c == before);
        let Some(index) = position else {
            // Already unhooked; swept at the end of the commit like a removal
            self.detached.push(child);
            return Err(HostError::MissingReferenceChild {
                parent: parent.clone(),
                child: before,
            });
        };
        self.children_mut(parent)?.insert(index, child);
        self.arena.set_parent(child, Some(parent.clone()));
        Ok(())
    }

    /// Take `child` out of `parent`. The node stays in the arena until the
    /// end of the commit, in case it gets attached again.
    pub fn remove_child(&mut self, parent: &ParentId, child: InstanceId) -> Result<()> {
        let children = self.children_mut(parent)?;
        let index = children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| HostError::MissingChild {
                parent: parent.clone(),
                child,
            })?;
        children.remove(index);
        self.arena.set_parent(child, None);
        self.detached.push(child);
        Ok(())
    }

    pub fn update_props(&mut self, id: InstanceId, payload: UpdatePayload) -> Result<()> {
        match self.arena.get_mut(id) {
            Some(HostNode::Instance(instance)) => {
                instance.prop = payload.prop;
                instance.attributes = payload.attributes;
                Ok(())
            }
            Some(HostNode::Text(_)) => Err(HostError::UnexpectedNodeKind {
                id,
                expected: "an instance",
            }),
            None => Err(HostError::UnknownInstance(id)),
        }
    }

    pub fn update_text(&mut self, id: InstanceId, text: SmartString) -> Result<()> {
        match self.arena.get_mut(id) {
            Some(HostNode::Text(node)) => {
                node.text = text;
                Ok(())
            }
            Some(HostNode::Instance(_)) => Err(HostError::UnexpectedNodeKind {
                id,
                expected: "a text instance",
            }),
            None => Err(HostError::UnknownInstance(id)),
        }
    }

    /// Dispose every detached node that has not been attached again.
    pub fn sweep_detached(&mut self) -> usize {
        let mut disposed = 0;
        for id in std::mem::take(&mut self.detached) {
            if self.arena.get_parent(id).is_none() {
                disposed += self.arena.dispose(id);
            }
        }
        disposed
    }

    /// Drop a root container together with anything still mounted in it
    pub fn unregister_root(&mut self, root_id: &RootId) -> usize {
        let Some(container) = self.roots.unregister(root_id) else {
            return 0;
        };
        container
            .children
            .iter()
            .map(|&child| self.arena.dispose(child))
            .sum()
    }

    pub fn snapshot_root(&self, root_id: &str) -> Option<Result<Vec<HostSnapshot>>> {
        let container = self.roots.get(root_id)?;
        Some(
            container
                .children
                .iter()
                .map(|&child| HostSnapshot::capture(&self.arena, child))
                .collect(),
        )
    }
}

/// Apply `ops` in order. Stops at the first failure; whatever was applied
/// before it stays applied.
pub fn apply_mutations(tree: &mut HostTree, ops: Vec<MutationOp>) -> Result<CommitSummary> {
    let mut summary = CommitSummary::default();

    for op in ops {
        tracing::trace!(op = op.name(), "Applying mutation");
        match op {
            MutationOp::CreateInstance(instance) => {
                tree.insert(HostNode::Instance(instance));
            }
            MutationOp::CreateText(text) => {
                tree.insert(HostNode::Text(text));
            }
            MutationOp::Append { parent, child } => tree.append_child(&parent, child)?,
            MutationOp::InsertBefore {
                parent,
                child,
                before,
            } => tree.insert_before(&parent, child, before)?,
            MutationOp::Remove { parent, child } => tree.remove_child(&parent, child)?,
            MutationOp::UpdateProps { id, payload } => tree.update_props(id, payload)?,
            MutationOp::UpdateText { id, text } => tree.update_text(id, text)?,
        }
        summary.applied += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{IdAllocator, Instance, TextInstance};
    use serde_json::{Value, json};

    struct Fixture {
        tree: HostTree,
        ids: IdAllocator,
        root: ParentId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut tree = HostTree::new();
            let root_id = RootId::from("root");
            tree.roots_mut().register(&root_id);
            Self {
                tree,
                ids: IdAllocator::new(),
                root: ParentId::Container(root_id),
            }
        }

        fn instance(&mut self, kind: &str) -> InstanceId {
            let id = self.ids.allocate();
            self.tree.insert(HostNode::Instance(Instance {
                id,
                kind: kind.into(),
                children: ChildList::new(),
                prop: Value::Null,
                attributes: Default::default(),
            }))
        }

        fn text(&mut self, text: &str) -> InstanceId {
            let id = self.ids.allocate();
            self.tree.insert(HostNode::Text(TextInstance {
                id,
                text: text.into(),
            }))
        }

        fn root_children(&self) -> Vec<InstanceId> {
            self.tree.children(&self.root).unwrap().to_vec()
        }
    }

    #[test]
    fn test_append_twice_moves_once() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let b = fx.instance("b");

        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, b).unwrap();
        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, a).unwrap();

        assert_eq!(fx.root_children(), vec![b, a]);
    }

    #[test]
    fn test_append_moves_between_parents() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let list = fx.instance("list");
        let item = fx.instance("item");

        fx.tree.append_child(&root, list).unwrap();
        fx.tree.append_child(&root, item).unwrap();
        fx.tree.append_child(&ParentId::Instance(list), item).unwrap();

        assert_eq!(fx.root_children(), vec![list]);
        assert_eq!(fx.tree.children(&ParentId::Instance(list)).unwrap(), &[item]);
    }

    #[test]
    fn test_insert_before() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let b = fx.instance("b");
        let c = fx.instance("c");

        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, b).unwrap();
        fx.tree.insert_before(&root, c, a).unwrap();
        assert_eq!(fx.root_children(), vec![c, a, b]);

        // Moving an existing child
        fx.tree.insert_before(&root, b, c).unwrap();
        assert_eq!(fx.root_children(), vec![b, c, a]);
    }

    #[test]
    fn test_insert_before_missing_reference() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let b = fx.instance("b");
        let c = fx.instance("c");
        let z = fx.instance("z");

        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, b).unwrap();

        let err = fx.tree.insert_before(&root, c, z).unwrap_err();
        assert_eq!(
            err,
            HostError::MissingReferenceChild {
                parent: root.clone(),
                child: z,
            }
        );
        assert_eq!(fx.root_children(), vec![a, b]);
    }

    #[test]
    fn test_failed_insert_before_child_is_swept() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let b = fx.instance("b");

        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, b).unwrap();
        fx.tree.remove_child(&root, b).unwrap();

        let err = fx.tree.insert_before(&root, a, b).unwrap_err();
        assert!(matches!(err, HostError::MissingReferenceChild { .. }));
        assert!(fx.root_children().is_empty());

        assert_eq!(fx.tree.sweep_detached(), 2);
        assert!(fx.tree.arena().is_empty());
    }

    #[test]
    fn test_remove_child() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let b = fx.instance("b");

        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, b).unwrap();
        fx.tree.remove_child(&root, a).unwrap();

        assert_eq!(fx.root_children(), vec![b]);
        assert_eq!(
            fx.tree.remove_child(&root, a),
            Err(HostError::MissingChild {
                parent: root.clone(),
                child: a,
            })
        );
    }

    #[test]
    fn test_sweep_disposes_only_unattached() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let b = fx.instance("b");
        let t = fx.text("inside a");

        fx.tree.append_child(&ParentId::Instance(a), t).unwrap();
        fx.tree.append_child(&root, a).unwrap();
        fx.tree.append_child(&root, b).unwrap();

        fx.tree.remove_child(&root, a).unwrap();
        fx.tree.remove_child(&root, b).unwrap();
        fx.tree.append_child(&root, b).unwrap();

        assert_eq!(fx.tree.sweep_detached(), 2);
        assert!(fx.tree.node(a).is_none());
        assert!(fx.tree.node(t).is_none());
        assert!(fx.tree.node(b).is_some());
        assert_eq!(fx.root_children(), vec![b]);
    }

    #[test]
    fn test_update_props_and_text() {
        let mut fx = Fixture::new();
        let a = fx.instance("a");
        let t = fx.text("old");

        fx.tree
            .update_props(
                a,
                UpdatePayload {
                    prop: json!(5),
                    attributes: Default::default(),
                },
            )
            .unwrap();
        fx.tree.update_text(t, "new".into()).unwrap();

        assert_eq!(fx.tree.node(a).unwrap().as_instance().unwrap().prop, json!(5));
        assert_eq!(fx.tree.node(t).unwrap().as_text().unwrap().text.as_str(), "new");
        assert!(matches!(
            fx.tree.update_text(a, "x".into()),
            Err(HostError::UnexpectedNodeKind { .. })
        ));
    }

    #[test]
    fn test_apply_mutations_in_order() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let div = fx.ids.allocate();
        let text = fx.ids.allocate();

        let ops = vec![
            MutationOp::CreateInstance(Instance {
                id: div,
                kind: "div".into(),
                children: ChildList::new(),
                prop: json!("p"),
                attributes: Default::default(),
            }),
            MutationOp::CreateText(TextInstance {
                id: text,
                text: "hello".into(),
            }),
            MutationOp::Append {
                parent: ParentId::Instance(div),
                child: text,
            },
            MutationOp::Append {
                parent: root.clone(),
                child: div,
            },
        ];

        let summary = apply_mutations(&mut fx.tree, ops).unwrap();
        assert_eq!(summary.applied, 4);

        let snapshot = fx.tree.snapshot_root("root").unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].kind(), Some("div"));
        assert_eq!(snapshot[0].children()[0].text(), Some("hello"));
    }

    #[test]
    fn test_failed_batch_keeps_applied_ops() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        let missing = fx.ids.allocate();

        let ops = vec![
            MutationOp::Append {
                parent: root.clone(),
                child: a,
            },
            MutationOp::Remove {
                parent: root.clone(),
                child: missing,
            },
        ];

        let err = apply_mutations(&mut fx.tree, ops).unwrap_err();
        assert!(matches!(err, HostError::MissingChild { .. }));
        assert_eq!(fx.root_children(), vec![a]);
    }

    #[test]
    fn test_unknown_parent() {
        let mut fx = Fixture::new();
        let a = fx.instance("a");
        let err = fx
            .tree
            .append_child(&ParentId::Container("nope".into()), a)
            .unwrap_err();
        assert_eq!(err, HostError::UnknownRoot("nope".into()));
    }

    #[test]
    fn test_unregister_root_disposes_remaining() {
        let mut fx = Fixture::new();
        let root = fx.root.clone();
        let a = fx.instance("a");
        fx.tree.append_child(&root, a).unwrap();

        assert_eq!(fx.tree.unregister_root(&RootId::from("root")), 1);
        assert!(fx.tree.snapshot_root("root").is_none());
        assert!(fx.tree.arena().is_empty());
    }
}
