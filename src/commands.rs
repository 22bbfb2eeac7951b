//! The collar command grammar, bound onto a [`CommandTree`].

use crate::dispatch::{CommandContext, CommandTree, NodeId, NodeSpec, prefixed};
use crate::display::Display;
use crate::error::{CommandResult, DuplicateBindingError};
use crate::services::{Collar, CollarService};
use crate::world::World;
use std::sync::Arc;

pub mod arguments;
mod friend;
mod group;
mod location;
mod service;
mod waypoint;

pub use crate::error::CommandError;

/// Literal every command hangs under when commands are prefixed.
pub const PREFIX: &str = "collar";

/// Everything a collar command talks to.
#[derive(Clone)]
pub struct CollarCommands {
    pub collar: Arc<CollarService>,
    pub display: Arc<dyn Display>,
    pub world: Arc<dyn World>,
    prefix: Option<&'static str>,
}

impl CollarCommands {
    pub fn new(
        collar: Arc<CollarService>,
        display: Arc<dyn Display>,
        world: Arc<dyn World>,
        prefixed: bool,
    ) -> Self {
        Self {
            collar,
            display,
            world,
            prefix: prefixed.then_some(PREFIX),
        }
    }

    /// Registers the whole grammar.
    pub fn register<S: 'static>(&self, tree: &mut CommandTree<S>) -> Result<(), DuplicateBindingError> {
        service::register(self, tree)?;
        friend::register(self, tree)?;
        location::register(self, tree)?;
        waypoint::register(self, tree)?;
        group::register(self, tree)?;
        tracing::debug!(nodes = tree.len(), prefixed = self.prefix.is_some(), "collar commands registered");
        Ok(())
    }

    fn path(&self, rest: impl IntoIterator<Item = NodeSpec>) -> Vec<NodeSpec> {
        prefixed(self.prefix, rest)
    }

    /// Binds `handler` to the prefixed path `rest`.
    fn on<S, F>(
        &self,
        tree: &mut CommandTree<S>,
        rest: impl IntoIterator<Item = NodeSpec>,
        handler: F,
    ) -> Result<NodeId, DuplicateBindingError>
    where
        S: 'static,
        F: Fn(&CollarCommands, &CommandContext<'_, S>) -> CommandResult + Send + Sync + 'static,
    {
        let this = self.clone();
        tree.register(self.path(rest), move |ctx: &CommandContext<'_, S>| handler(&this, ctx))
    }

    /// Runs `f` against the live session, or fails with `NotConnected`.
    fn connected<R>(&self, f: impl FnOnce(&dyn Collar) -> R) -> Result<R, CommandError> {
        self.collar.with(f).ok_or(CommandError::NotConnected)
    }
}
