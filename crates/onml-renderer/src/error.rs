use crate::node::{InstanceId, ParentId, RootId};
use crate::scheduler::Priority;
use thiserror::Error;

/// Errors raised while reconciling or committing into the host tree.
///
/// All of them mean the renderer and the tree disagree about what is
/// mounted. They are returned to the caller as soon as they happen and
/// nothing already applied is rolled back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Scheduling {0} callback twice is excessive")]
    DoubleScheduling(Priority),

    #[error("Reference child {child} does not exist in {parent}")]
    MissingReferenceChild { parent: ParentId, child: InstanceId },

    #[error("Child {child} does not exist in {parent}")]
    MissingChild { parent: ParentId, child: InstanceId },

    #[error("Unknown instance {0}")]
    UnknownInstance(InstanceId),

    #[error("Unknown root '{0}'")]
    UnknownRoot(RootId),

    #[error("Node {id} is not {expected}")]
    UnexpectedNodeKind { id: InstanceId, expected: &'static str },

    #[error("Simulated error in host config")]
    SimulatedFailure,
}

pub type Result<T> = std::result::Result<T, HostError>;
