use super::types::{Instance, InstanceId, ParentId, TextInstance, UpdatePayload};
use smartstring::alias::String as SmartString;

/// A single change to the host tree, produced by the diff and applied in
/// order by the commit phase.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOp {
    CreateInstance(Instance),
    CreateText(TextInstance),
    Append {
        parent: ParentId,
        child: InstanceId,
    },
    InsertBefore {
        parent: ParentId,
        child: InstanceId,
        before: InstanceId,
    },
    Remove {
        parent: ParentId,
        child: InstanceId,
    },
    UpdateProps {
        id: InstanceId,
        payload: UpdatePayload,
    },
    UpdateText {
        id: InstanceId,
        text: SmartString,
    },
}

impl MutationOp {
    /// Short name used in traces
    pub fn name(&self) -> &'static str {
        match self {
            MutationOp::CreateInstance(_) => "create_instance",
            MutationOp::CreateText(_) => "create_text",
            MutationOp::Append { .. } => "append",
            MutationOp::InsertBefore { .. } => "insert_before",
            MutationOp::Remove { .. } => "remove",
            MutationOp::UpdateProps { .. } => "update_props",
            MutationOp::UpdateText { .. } => "update_text",
        }
    }
}
