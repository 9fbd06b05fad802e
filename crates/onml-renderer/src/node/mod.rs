mod arena;
mod commands;
mod snapshot;
mod types;

pub use arena::{IdAllocator, InstanceArena};
pub use commands::MutationOp;
pub use snapshot::HostSnapshot;
pub use types::{
    ChildList, Container, HostNode, Instance, InstanceId, ParentId, RootId, TextInstance,
    UpdatePayload,
};
