//! Walks a command line through a [`CommandTree`].
//!
//! At every depth an exact literal match wins outright. Otherwise argument
//! children are tried in registration order, and when one parses but its
//! subtree fails to resolve, the walk backtracks to the next sibling. If
//! nothing resolves, the failure that got furthest into the line is reported.

use crate::dispatch::context::CommandContext;
use crate::dispatch::path::NodeSpec;
use crate::dispatch::tree::{BindingPolicy, CommandTree, NodeId, NodeKind, TreeSnapshot};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::input::arguments::{ArgValue, ArgumentError};
use crate::input::reader::Cursor;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub enum DispatchResult {
    /// The line resolved and the bound action ran; carries what it returned.
    Success(CommandResult),
    /// No command by that name, or the line stopped before reaching an action.
    NoMatch,
    /// A token was malformed, or input was left over after a complete command.
    ParseError {
        node: String,
        position: usize,
        reason: String,
    },
    /// A token was well-formed but named something that does not exist.
    ResolutionError {
        node: String,
        position: usize,
        reason: String,
    },
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Success(Ok(())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    NoMatch,
    Parse,
    Resolution,
}

#[derive(Debug)]
struct Failure {
    kind: FailureKind,
    node: String,
    position: usize,
    reason: String,
}

impl Failure {
    fn new(kind: FailureKind, node: &str, position: usize, reason: impl Into<String>) -> Self {
        Self {
            kind,
            node: node.to_string(),
            position,
            reason: reason.into(),
        }
    }

    fn from_argument(node: &str, position: usize, err: ArgumentError) -> Self {
        match err {
            ArgumentError::Parse(reason) => Self::new(FailureKind::Parse, node, position, reason),
            ArgumentError::Resolution(reason) => {
                Self::new(FailureKind::Resolution, node, position, reason)
            }
        }
    }

    /// Furthest position wins; on a tie a real error beats a plain no-match,
    /// otherwise the first one recorded stays.
    fn better_than(&self, other: &Failure) -> bool {
        self.position > other.position
            || (self.position == other.position
                && other.kind == FailureKind::NoMatch
                && self.kind != FailureKind::NoMatch)
    }
}

fn keep_best(best: &mut Option<Failure>, candidate: Failure) {
    match best {
        Some(current) if !candidate.better_than(current) => {}
        _ => *best = Some(candidate),
    }
}

type Bound = Vec<(String, ArgValue)>;

impl<S> CommandTree<S> {
    pub fn dispatch(&self, source: S, line: &str) -> DispatchResult {
        let mut bound = Bound::new();
        match self.walk(Self::ROOT, Cursor::new(line), &mut bound) {
            Ok(id) => {
                let Some(action) = self.node(id).action.clone() else {
                    return DispatchResult::NoMatch;
                };
                let arguments: HashMap<String, ArgValue> = bound.into_iter().collect();
                let ctx = CommandContext::new(source, line, arguments);
                DispatchResult::Success(action(&ctx))
            }
            Err(f) => {
                tracing::debug!(line, node = %f.node, position = f.position, reason = %f.reason, kind = ?f.kind, "dispatch failed");
                match f.kind {
                    FailureKind::NoMatch => DispatchResult::NoMatch,
                    FailureKind::Parse => DispatchResult::ParseError {
                        node: f.node,
                        position: f.position,
                        reason: f.reason,
                    },
                    FailureKind::Resolution => DispatchResult::ResolutionError {
                        node: f.node,
                        position: f.position,
                        reason: f.reason,
                    },
                }
            }
        }
    }

    /// `cursor` sits just past the token that matched `id`.
    fn walk(&self, id: NodeId, cursor: Cursor<'_>, bound: &mut Bound) -> Result<NodeId, Failure> {
        let node = self.node(id);
        let here = cursor.skip_whitespace();

        if here.is_at_end() {
            if node.is_executable() {
                return Ok(id);
            }
            return Err(Failure::new(
                FailureKind::NoMatch,
                node.kind.name(),
                here.position(),
                "incomplete command",
            ));
        }

        // Literals are unambiguous: once one matches we never look elsewhere.
        let (token, after_token) = here.read_unquoted();
        if let Some(&child) = node.children.iter().find(
            |c| matches!(&self.node(**c).kind, NodeKind::Literal(name) if name == token),
        ) {
            return self.walk(child, after_token, bound);
        }

        let mut best: Option<Failure> = None;
        for &child in &node.children {
            let NodeKind::Argument { name, parser } = &self.node(child).kind else {
                continue;
            };

            let (value, after) = match parser.parse_dyn(here) {
                Ok(parsed) => parsed,
                Err(e) => {
                    keep_best(&mut best, Failure::from_argument(name, here.position(), e));
                    continue;
                }
            };
            if after.position() == here.position() {
                keep_best(
                    &mut best,
                    Failure::new(FailureKind::Parse, name, here.position(), "expected a value"),
                );
                continue;
            }
            if !after.at_separator() {
                keep_best(
                    &mut best,
                    Failure::new(
                        FailureKind::Parse,
                        name,
                        after.position(),
                        "expected whitespace to end one argument",
                    ),
                );
                continue;
            }

            let mark = bound.len();
            bound.push((name.clone(), value));
            match self.walk(child, after, bound) {
                Ok(found) => return Ok(found),
                Err(f) => {
                    bound.truncate(mark);
                    keep_best(&mut best, f);
                }
            }
        }

        // A complete command followed by input no child could finish is
        // trailing input, not an unknown command.
        let trailing = || {
            Failure::new(
                FailureKind::Parse,
                node.kind.name(),
                here.position(),
                format!("unexpected trailing input '{}'", here.remaining()),
            )
        };
        match best {
            Some(f) if node.is_executable() && f.kind == FailureKind::NoMatch => return Err(trailing()),
            Some(f) => return Err(f),
            None if node.is_executable() => return Err(trailing()),
            None => {}
        }
        Err(Failure::new(
            FailureKind::NoMatch,
            node.kind.name(),
            here.position(),
            format!("unknown command '{token}'"),
        ))
    }
}

/// Command tree behind a reader-writer lock, for hosts that keep registering
/// commands after dispatch traffic has started.
pub struct SharedDispatcher<S> {
    tree: Arc<RwLock<CommandTree<S>>>,
}

impl<S> Clone for SharedDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<S> SharedDispatcher<S> {
    pub fn new(tree: CommandTree<S>) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn register<F>(
        &self,
        path: Vec<NodeSpec>,
        action: F,
        policy: BindingPolicy,
    ) -> Result<NodeId, DuplicateBindingError>
    where
        F: Fn(&CommandContext<'_, S>) -> CommandResult + Send + Sync + 'static,
    {
        self.tree.write().register_with(path, action, policy)
    }

    /// Dispatches against a consistent view of the tree. The read lock is
    /// held while the action runs, so actions must not register commands.
    pub fn dispatch(&self, source: S, line: &str) -> DispatchResult {
        self.tree.read().dispatch(source, line)
    }

    pub fn usage(&self) -> Vec<String> {
        self.tree.read().usage()
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.read().snapshot()
    }
}
