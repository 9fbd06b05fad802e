use super::arena::InstanceArena;
use super::types::{HostNode, InstanceId};
use crate::element::Attributes;
use crate::error::{HostError, Result};
use serde::Serialize;
use serde_json::Value;
use smartstring::alias::String as SmartString;
use std::fmt::Write;

/// Owned, read-only copy of a host sub-tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostSnapshot {
    Instance {
        id: InstanceId,
        kind: SmartString,
        prop: Value,
        #[serde(skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
        children: Vec<HostSnapshot>,
    },
    Text {
        id: InstanceId,
        text: SmartString,
    },
}

impl HostSnapshot {
    /// Copy the sub-tree rooted at `id` out of the arena
    pub fn capture(arena: &InstanceArena, id: InstanceId) -> Result<Self> {
        match arena.get(id).ok_or(HostError::UnknownInstance(id))? {
            HostNode::Instance(instance) => Ok(HostSnapshot::Instance {
                id,
                kind: instance.kind.clone(),
                prop: instance.prop.clone(),
                attributes: instance.attributes.clone(),
                children: instance
                    .children
                    .iter()
                    .map(|&child| Self::capture(arena, child))
                    .collect::<Result<_>>()?,
            }),
            HostNode::Text(text) => Ok(HostSnapshot::Text {
                id,
                text: text.text.clone(),
            }),
        }
    }

    pub fn id(&self) -> InstanceId {
        match self {
            HostSnapshot::Instance { id, .. } | HostSnapshot::Text { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            HostSnapshot::Instance { kind, .. } => Some(kind),
            HostSnapshot::Text { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            HostSnapshot::Text { text, .. } => Some(text),
            HostSnapshot::Instance { .. } => None,
        }
    }

    pub fn prop(&self) -> Option<&Value> {
        match self {
            HostSnapshot::Instance { prop, .. } => Some(prop),
            HostSnapshot::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[HostSnapshot] {
        match self {
            HostSnapshot::Instance { children, .. } => children,
            HostSnapshot::Text { .. } => &[],
        }
    }

    /// Ids of this node and all its descendants, depth first
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids = vec![self.id()];
        for child in self.children() {
            ids.extend(child.ids());
        }
        ids
    }

    /// Same tree with every id zeroed, for comparing shapes across renders
    pub fn shape(&self) -> HostSnapshot {
        match self {
            HostSnapshot::Instance {
                kind,
                prop,
                attributes,
                children,
                ..
            } => HostSnapshot::Instance {
                id: InstanceId(0),
                kind: kind.clone(),
                prop: prop.clone(),
                attributes: attributes.clone(),
                children: children.iter().map(HostSnapshot::shape).collect(),
            },
            HostSnapshot::Text { text, .. } => HostSnapshot::Text {
                id: InstanceId(0),
                text: text.clone(),
            },
        }
    }

    /// Append an indented, human readable rendering of this sub-tree
    pub fn write_tree(&self, out: &mut String, indent: usize) {
        let indent_str = "  ".repeat(indent);
        match self {
            HostSnapshot::Instance {
                id,
                kind,
                prop,
                children,
                ..
            } => {
                if prop.is_null() {
                    let _ = writeln!(out, "{}{}(id={})", indent_str, kind, id.0);
                } else {
                    let _ = writeln!(out, "{}{}(id={}, prop={})", indent_str, kind, id.0, prop);
                }
                for child in children {
                    child.write_tree(out, indent + 1);
                }
            }
            HostSnapshot::Text { id, text } => {
                let _ = writeln!(out, "{}\"{}\"(id={})", indent_str, text, id.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{IdAllocator, Instance, ParentId, TextInstance};
    use serde_json::json;

    #[test]
    fn test_capture_nested() {
        let mut ids = IdAllocator::new();
        let mut arena = InstanceArena::new();
        let parent = ids.allocate();
        let child = ids.allocate();

        arena.insert(HostNode::Instance(Instance {
            id: parent,
            kind: "div".into(),
            children: [child].into_iter().collect(),
            prop: json!(1),
            attributes: Default::default(),
        }));
        arena.insert(HostNode::Text(TextInstance {
            id: child,
            text: "hello".into(),
        }));
        arena.set_parent(child, Some(ParentId::Instance(parent)));

        let snapshot = HostSnapshot::capture(&arena, parent).unwrap();
        assert_eq!(snapshot.kind(), Some("div"));
        assert_eq!(snapshot.prop(), Some(&json!(1)));
        assert_eq!(snapshot.children().len(), 1);
        assert_eq!(snapshot.children()[0].text(), Some("hello"));
        assert_eq!(snapshot.ids(), vec![parent, child]);
    }

    #[test]
    fn test_capture_unknown_id() {
        let arena = InstanceArena::new();
        assert_eq!(
            HostSnapshot::capture(&arena, InstanceId(7)),
            Err(HostError::UnknownInstance(InstanceId(7)))
        );
    }

    #[test]
    fn test_serialize_snapshot() {
        let snapshot = HostSnapshot::Instance {
            id: InstanceId(3),
            kind: "span".into(),
            prop: Value::Null,
            attributes: Default::default(),
            children: vec![HostSnapshot::Text {
                id: InstanceId(4),
                text: "x".into(),
            }],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "instance",
                "id": 3,
                "kind": "span",
                "prop": null,
                "children": [{ "type": "text", "id": 4, "text": "x" }]
            })
        );
    }

    #[test]
    fn test_write_tree() {
        let snapshot = HostSnapshot::Instance {
            id: InstanceId(0),
            kind: "div".into(),
            prop: json!("a"),
            attributes: Default::default(),
            children: vec![HostSnapshot::Text {
                id: InstanceId(1),
                text: "t".into(),
            }],
        };

        let mut out = String::new();
        snapshot.write_tree(&mut out, 0);
        assert_eq!(out, "div(id=0, prop=\"a\")\n  \"t\"(id=1)\n");
    }
}
