pub mod builder;
pub mod commit;
pub mod config;
pub mod diff;
pub mod element;
pub mod error;
pub mod host_config;
pub mod logging;
pub mod node;
pub mod reconciler;
pub mod registry;
pub mod renderer;
pub mod scheduler;

// Re-export key types
pub use config::{ConfigError, RendererConfig};
pub use element::{Component, Element, Node, Props};
pub use error::{HostError, Result};
pub use host_config::{HostConfig, HostContext};
pub use node::{HostSnapshot, InstanceId, MutationOp, ParentId, RootId};
pub use reconciler::{Reconciler, RenderCallback, RootHandle};
pub use renderer::{RenderStats, TreeRenderer};
pub use scheduler::{Deadline, Priority};
