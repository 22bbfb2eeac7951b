//! Command tree dispatcher: literal and typed-argument nodes in an arena,
//! merged from flat paths and walked with backtracking.

mod context;
mod dispatcher;
mod path;
mod tree;

pub use context::CommandContext;
pub use dispatcher::{DispatchResult, SharedDispatcher};
pub use path::{NodeSpec, arg, lit, prefixed, usage_of};
pub use tree::{Action, BindingPolicy, CommandNode, CommandTree, NodeId, NodeKind, NodeSnapshot, TreeError, TreeSnapshot};
