pub mod command;
pub mod diagnostic;
pub mod layout;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod store;
pub mod task;

pub use command::{CommandResult, ScriptGateway, TaskCommand, TaskCommandGateway, ToolEnv};
pub use diagnostic::Diagnostic;
pub use layout::{resolve_layout, FsProbe, Layout, LayoutOverrides, PathProbe};
pub use store::{StoreError, TaskStore};
pub use task::{Snapshot, Task, TaskId, TaskStatus};
