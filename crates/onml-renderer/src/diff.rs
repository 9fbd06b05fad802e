//! Diff phase: compares the live children of a parent against a new
//! declarative tree and emits the ops that turn one into the other.
//!
//! Matching is purely positional. A node at index `i` is compared with the
//! old child at index `i`; there are no keys. Nodes of the same kind are
//! always updated, never skipped, because props are not compared.

use crate::builder;
use crate::element::{Node, ResolvedNode};
use crate::error::{HostError, Result};
use crate::node::{
    HostNode, HostSnapshot, IdAllocator, InstanceArena, InstanceId, MutationOp, ParentId,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    pub retain_attributes: bool,
}

/// Ops to apply plus the tree they are expected to produce
#[derive(Debug, Default)]
pub struct DiffResult {
    pub ops: Vec<MutationOp>,
    /// Children of the diffed parent once `ops` are applied
    pub next: Vec<HostSnapshot>,
    /// Hidden sub-trees seen while mounting
    pub deprioritized: usize,
}

struct Differ<'a> {
    arena: &'a InstanceArena,
    ids: &'a mut IdAllocator,
    options: DiffOptions,
    ops: Vec<MutationOp>,
    deprioritized: usize,
}

/// Diff `parent`, whose current children are `old_children`, against
/// `element`. `None` tears every child down.
pub fn diff(
    arena: &InstanceArena,
    ids: &mut IdAllocator,
    parent: ParentId,
    old_children: &[InstanceId],
    element: Option<&Node>,
    options: DiffOptions,
) -> Result<DiffResult> {
    let new_children = element.map(Node::resolve).unwrap_or_default();

    let mut differ = Differ {
        arena,
        ids,
        options,
        ops: Vec::new(),
        deprioritized: 0,
    };
    let next = differ.reconcile_children(&parent, old_children, new_children)?;

    Ok(DiffResult {
        ops: differ.ops,
        next,
        deprioritized: differ.deprioritized,
    })
}

impl Differ<'_> {
    fn reconcile_children(
        &mut self,
        parent: &ParentId,
        old: &[InstanceId],
        new: Vec<ResolvedNode>,
    ) -> Result<Vec<HostSnapshot>> {
        let arena = self.arena;
        let new_len = new.len();
        let mut next = Vec::with_capacity(new_len);

        for (index, node) in new.into_iter().enumerate() {
            let Some(&old_id) = old.get(index) else {
                let snapshot = self.mount(node)?;
                self.ops.push(MutationOp::Append {
                    parent: parent.clone(),
                    child: snapshot.id(),
                });
                next.push(snapshot);
                continue;
            };

            let old_node = arena
                .get(old_id)
                .ok_or(HostError::UnknownInstance(old_id))?;

            let snapshot = match (old_node, node) {
                (HostNode::Instance(instance), ResolvedNode::Host { kind, props })
                    if instance.kind == kind =>
                {
                    let payload = builder::prepare_update(
                        instance,
                        &props,
                        self.options.retain_attributes,
                    );
                    if let Some(payload) = payload {
                        self.ops.push(MutationOp::UpdateProps {
                            id: old_id,
                            payload,
                        });
                    }
                    let children = self.reconcile_children(
                        &ParentId::Instance(old_id),
                        &instance.children,
                        props.children().resolve(),
                    )?;
                    HostSnapshot::Instance {
                        id: old_id,
                        kind,
                        prop: props.prop().clone(),
                        attributes: builder::host_attributes(
                            &props,
                            self.options.retain_attributes,
                        ),
                        children,
                    }
                }
                (HostNode::Text(_), ResolvedNode::Text(text)) => {
                    self.ops.push(MutationOp::UpdateText {
                        id: old_id,
                        text: text.clone(),
                    });
                    HostSnapshot::Text { id: old_id, text }
                }
                (_, node) => {
                    self.ops.push(MutationOp::Remove {
                        parent: parent.clone(),
                        child: old_id,
                    });
                    let snapshot = self.mount(node)?;
                    // Old siblings after this one are still in place
                    match old.get(index + 1) {
                        Some(&before) => self.ops.push(MutationOp::InsertBefore {
                            parent: parent.clone(),
                            child: snapshot.id(),
                            before,
                        }),
                        None => self.ops.push(MutationOp::Append {
                            parent: parent.clone(),
                            child: snapshot.id(),
                        }),
                    }
                    snapshot
                }
            };
            next.push(snapshot);
        }

        for &stale in old.iter().skip(new_len).rev() {
            self.ops.push(MutationOp::Remove {
                parent: parent.clone(),
                child: stale,
            });
        }

        Ok(next)
    }

    /// Create a whole new sub-tree. Children are appended to their fresh
    /// parent; attaching the sub-tree itself is left to the caller.
    fn mount(&mut self, node: ResolvedNode) -> Result<HostSnapshot> {
        match node {
            ResolvedNode::Text(text) => {
                let text_instance = builder::create_text_instance(self.ids, &text);
                let id = text_instance.id;
                self.ops.push(MutationOp::CreateText(text_instance));
                Ok(HostSnapshot::Text { id, text })
            }
            ResolvedNode::Host { kind, props } => {
                if builder::should_deprioritize_subtree(&kind, &props) {
                    tracing::trace!(kind = %kind, "Mounting hidden sub-tree");
                    self.deprioritized += 1;
                }

                let instance = builder::create_instance(
                    self.ids,
                    &kind,
                    &props,
                    self.options.retain_attributes,
                );
                let id = instance.id;
                let prop = instance.prop.clone();
                let attributes = instance.attributes.clone();
                self.ops.push(MutationOp::CreateInstance(instance));

                let mut children = Vec::new();
                for child in props.children().resolve() {
                    let snapshot = self.mount(child)?;
                    self.ops.push(MutationOp::Append {
                        parent: ParentId::Instance(id),
                        child: snapshot.id(),
                    });
                    children.push(snapshot);
                }

                Ok(HostSnapshot::Instance {
                    id,
                    kind,
                    prop,
                    attributes,
                    children,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{HostTree, apply_mutations};
    use crate::element::Element;
    use crate::node::RootId;
    use serde_json::json;

    struct Harness {
        tree: HostTree,
        ids: IdAllocator,
        root: RootId,
    }

    impl Harness {
        fn new() -> Self {
            let mut tree = HostTree::new();
            let root = RootId::from("root");
            tree.roots_mut().register(&root);
            Self {
                tree,
                ids: IdAllocator::new(),
                root,
            }
        }

        fn parent(&self) -> ParentId {
            ParentId::Container(self.root.clone())
        }

        fn diff(&mut self, element: Option<&Node>) -> DiffResult {
            let parent = self.parent();
            let old = self.tree.children(&parent).unwrap().to_vec();
            diff(
                self.tree.arena(),
                &mut self.ids,
                parent,
                &old,
                element,
                DiffOptions::default(),
            )
            .unwrap()
        }

        /// Diff, commit, and check the committed tree matches the prediction
        fn render(&mut self, element: Option<&Node>) -> Vec<MutationOp> {
            let result = self.diff(element);
            let ops = result.ops.clone();
            apply_mutations(&mut self.tree, result.ops).unwrap();
            self.tree.sweep_detached();
            assert_eq!(self.snapshot(), result.next);
            ops
        }

        fn snapshot(&self) -> Vec<HostSnapshot> {
            self.tree.snapshot_root(&self.root).unwrap().unwrap()
        }
    }

    fn names(ops: &[MutationOp]) -> Vec<&'static str> {
        ops.iter().map(MutationOp::name).collect()
    }

    #[test]
    fn test_first_render_creates_and_appends() {
        let mut h = Harness::new();
        let tree: Node = Element::new("div").prop(1).child("hi").into();

        let ops = h.render(Some(&tree));
        assert_eq!(names(&ops), vec!["create_instance", "create_text", "append", "append"]);

        let snapshot = h.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].kind(), Some("div"));
        assert_eq!(snapshot[0].prop(), Some(&json!(1)));
        assert_eq!(snapshot[0].children()[0].text(), Some("hi"));
    }

    #[test]
    fn test_same_kind_always_updates() {
        let mut h = Harness::new();
        let tree: Node = Element::new("div").prop(1).child("hi").into();
        h.render(Some(&tree));
        let before = h.snapshot();

        // Identical tree still produces update ops
        let ops = h.render(Some(&tree));
        assert_eq!(names(&ops), vec!["update_props", "update_text"]);

        let after = h.snapshot();
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_keeps_identity() {
        let mut h = Harness::new();
        h.render(Some(&Element::new("div").prop(1).into()));
        let id = h.snapshot()[0].id();

        h.render(Some(&Element::new("div").prop(2).into()));
        let snapshot = h.snapshot();
        assert_eq!(snapshot[0].id(), id);
        assert_eq!(snapshot[0].prop(), Some(&json!(2)));
    }

    #[test]
    fn test_kind_change_replaces_in_place() {
        let mut h = Harness::new();
        let first: Node = Node::Fragment(vec![
            Element::new("a").into(),
            Element::new("b").into(),
            Element::new("c").into(),
        ]);
        h.render(Some(&first));
        let old = h.snapshot();

        let second: Node = Node::Fragment(vec![
            Element::new("a").into(),
            Element::new("x").into(),
            Element::new("c").into(),
        ]);
        let ops = h.render(Some(&second));
        assert_eq!(
            names(&ops),
            vec!["update_props", "remove", "create_instance", "insert_before", "update_props"]
        );
        assert_eq!(
            ops[1],
            MutationOp::Remove {
                parent: h.parent(),
                child: old[1].id(),
            }
        );

        let kinds: Vec<_> = h.snapshot().iter().map(|s| s.kind().unwrap().to_string()).collect();
        assert_eq!(kinds, vec!["a", "x", "c"]);
    }

    #[test]
    fn test_kind_change_at_end_appends() {
        let mut h = Harness::new();
        h.render(Some(&Node::Fragment(vec![Element::new("a").into(), "t".into()])));

        let ops = h.render(Some(&Node::Fragment(vec![
            Element::new("a").into(),
            Element::new("b").into(),
        ])));
        assert_eq!(names(&ops), vec!["update_props", "remove", "create_instance", "append"]);
    }

    #[test]
    fn test_surplus_children_removed_in_reverse() {
        let mut h = Harness::new();
        h.render(Some(&Node::Fragment(vec![
            Element::new("a").into(),
            Element::new("b").into(),
            Element::new("c").into(),
        ])));
        let old = h.snapshot();

        let ops = h.render(Some(&Element::new("a").into()));
        assert_eq!(
            ops[1..],
            [
                MutationOp::Remove {
                    parent: h.parent(),
                    child: old[2].id(),
                },
                MutationOp::Remove {
                    parent: h.parent(),
                    child: old[1].id(),
                },
            ]
        );
        assert_eq!(h.snapshot().len(), 1);
    }

    #[test]
    fn test_empty_tree_tears_everything_down() {
        let mut h = Harness::new();
        h.render(Some(
            &Element::new("span")
                .child(Element::new("div").child("x"))
                .child("y")
                .into(),
        ));

        let ops = h.render(None);
        assert_eq!(names(&ops), vec!["remove"]);
        assert!(h.snapshot().is_empty());
        assert!(h.tree.arena().is_empty());
    }

    #[test]
    fn test_text_content_becomes_text_child() {
        let mut h = Harness::new();
        h.render(Some(&Element::new("title").text("bar").into()));

        let snapshot = h.snapshot();
        assert_eq!(snapshot[0].children().len(), 1);
        assert_eq!(snapshot[0].children()[0].text(), Some("bar"));

        let ops = h.render(Some(&Element::new("title").text(7).into()));
        assert_eq!(names(&ops), vec!["update_props", "update_text"]);
        assert_eq!(h.snapshot()[0].children()[0].text(), Some("7"));
    }

    #[test]
    fn test_hidden_subtrees_are_counted() {
        let mut h = Harness::new();
        let tree: Node = Element::new("div")
            .child(Element::new("panel").attr("hidden", true))
            .into();

        let result = h.diff(Some(&tree));
        assert_eq!(result.deprioritized, 1);
    }

    #[test]
    fn test_unknown_old_child_fails() {
        let mut h = Harness::new();
        let tree: Node = Element::new("div").into();
        let parent = h.parent();
        let err = diff(
            h.tree.arena(),
            &mut h.ids,
            parent,
            &[InstanceId(99)],
            Some(&tree),
            DiffOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, HostError::UnknownInstance(InstanceId(99)));
    }
}
