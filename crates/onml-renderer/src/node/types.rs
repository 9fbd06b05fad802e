use crate::element::Attributes;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use smartstring::alias::String as SmartString;
use std::fmt;

/// Unique identifier for a host node. Never reused once handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId(pub(crate) u64);

impl InstanceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name under which a root container is registered.
pub type RootId = SmartString;

/// Ordered child list shared by instances and containers
pub type ChildList = SmallVec<[InstanceId; 4]>;

/// Target of a child-list operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentId {
    Container(RootId),
    Instance(InstanceId),
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentId::Container(root) => write!(f, "container '{}'", root),
            ParentId::Instance(id) => write!(f, "instance {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: InstanceId,
    pub kind: SmartString,
    pub children: ChildList,
    pub prop: Value,
    /// Non-`children` props, only filled when attribute retention is on
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInstance {
    pub id: InstanceId,
    pub text: SmartString,
}

/// A node of the live host tree
#[derive(Debug, Clone, PartialEq)]
pub enum HostNode {
    Instance(Instance),
    Text(TextInstance),
}

impl HostNode {
    pub fn id(&self) -> InstanceId {
        match self {
            HostNode::Instance(instance) => instance.id,
            HostNode::Text(text) => text.id,
        }
    }

    /// Children of an instance; text nodes have none.
    pub fn children(&self) -> &[InstanceId] {
        match self {
            HostNode::Instance(instance) => &instance.children,
            HostNode::Text(_) => &[],
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            HostNode::Instance(instance) => Some(instance),
            HostNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextInstance> {
        match self {
            HostNode::Text(text) => Some(text),
            HostNode::Instance(_) => None,
        }
    }
}

/// Top of a live tree, one per registered root name
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub root_id: RootId,
    pub children: ChildList,
}

impl Container {
    pub fn new(root_id: RootId) -> Self {
        Self {
            root_id,
            children: ChildList::new(),
        }
    }
}

/// New host-facing props for an instance that is being updated
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePayload {
    pub prop: Value,
    pub attributes: Attributes,
}
