//! Arena-backed command tree.
//!
//! Nodes live in a flat `Vec`; each node keeps the indices of its children in
//! registration order. Registering a path walks it from the root, reusing
//! nodes that already exist and appending the rest.

use crate::dispatch::context::CommandContext;
use crate::dispatch::path::{NodeSpec, usage_of};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::input::arguments::DynParser;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub type Action<S> = Arc<dyn Fn(&CommandContext<'_, S>) -> CommandResult + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// What to do when a path already has an action bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPolicy {
    #[default]
    Reject,
    Override,
}

pub enum NodeKind {
    Root,
    Literal(String),
    Argument {
        name: String,
        parser: Arc<dyn DynParser>,
    },
}

impl NodeKind {
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Root => "",
            NodeKind::Literal(name) => name,
            NodeKind::Argument { name, .. } => name,
        }
    }

    fn usage(&self) -> String {
        match self {
            NodeKind::Root => String::new(),
            NodeKind::Literal(name) => name.clone(),
            NodeKind::Argument { name, .. } => format!("<{name}>"),
        }
    }

    fn matches(&self, spec: &NodeSpec) -> bool {
        match (self, spec) {
            (NodeKind::Literal(a), NodeSpec::Literal(b)) => a == b,
            (
                NodeKind::Argument { name: a, parser: pa },
                NodeSpec::Argument { name: b, parser: pb },
            ) => a == b && pa.parser_id() == pb.parser_id(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Root => f.write_str("Root"),
            NodeKind::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            NodeKind::Argument { name, parser } => f
                .debug_struct("Argument")
                .field("name", name)
                .field("parser", &parser.parser_id())
                .finish(),
        }
    }
}

pub struct CommandNode<S> {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub action: Option<Action<S>>,
}

impl<S> CommandNode<S> {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            action: None,
        }
    }

    pub fn is_executable(&self) -> bool {
        self.action.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {parent:?} has two literal children named '{name}'")]
    DuplicateLiteral { parent: NodeId, name: String },

    #[error("node {parent:?} has two '{name}' arguments parsed by '{parser}'")]
    AmbiguousArgument {
        parent: NodeId,
        name: String,
        parser: String,
    },

    #[error("node {parent:?} points at missing child {child:?}")]
    DanglingChild { parent: NodeId, child: NodeId },

    #[error("node {0:?} has more than one parent")]
    SharedChild(NodeId),

    #[error("node {0:?} is not reachable from the root")]
    Unreachable(NodeId),
}

pub struct CommandTree<S> {
    nodes: Vec<CommandNode<S>>,
}

impl<S> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CommandTree<S> {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new(NodeKind::Root)],
        }
    }

    pub fn node(&self, id: NodeId) -> &CommandNode<S> {
        &self.nodes[id.0]
    }

    /// Adds `child` under `parent` without any checks.
    #[cfg(test)]
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Binds `action` to `path`, rejecting the registration if the path is
    /// already bound.
    pub fn register<F>(&mut self, path: Vec<NodeSpec>, action: F) -> Result<NodeId, DuplicateBindingError>
    where
        F: Fn(&CommandContext<'_, S>) -> CommandResult + Send + Sync + 'static,
    {
        self.register_with(path, action, BindingPolicy::Reject)
    }

    pub fn register_with<F>(
        &mut self,
        path: Vec<NodeSpec>,
        action: F,
        policy: BindingPolicy,
    ) -> Result<NodeId, DuplicateBindingError>
    where
        F: Fn(&CommandContext<'_, S>) -> CommandResult + Send + Sync + 'static,
    {
        let usage = usage_of(&path);

        // Check before touching the arena so a rejected registration leaves
        // no half-inserted nodes behind.
        if policy == BindingPolicy::Reject
            && let Some(existing) = self.lookup(&path)
            && self.node(existing).is_executable()
        {
            return Err(DuplicateBindingError { path: usage });
        }

        let mut cur = Self::ROOT;
        for spec in path {
            cur = match self.find_child(cur, &spec) {
                Some(child) => child,
                None => self.insert_child(cur, spec),
            };
        }

        if self.nodes[cur.0].action.is_some() {
            tracing::debug!(path = %usage, "overriding command binding");
        }
        self.nodes[cur.0].action = Some(Arc::new(action));
        Ok(cur)
    }

    /// Finds the node a path would end at, without inserting anything.
    pub fn lookup(&self, path: &[NodeSpec]) -> Option<NodeId> {
        let mut cur = Self::ROOT;
        for spec in path {
            cur = self.find_child(cur, spec)?;
        }
        Some(cur)
    }

    fn find_child(&self, parent: NodeId, spec: &NodeSpec) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].kind.matches(spec))
    }

    fn insert_child(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let kind = match spec {
            NodeSpec::Literal(name) => NodeKind::Literal(name),
            NodeSpec::Argument { name, parser } => NodeKind::Argument { name, parser },
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::new(kind));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Every executable path, in depth-first registration order.
    pub fn usage(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect_usage(Self::ROOT, &mut prefix, &mut out);
        out
    }

    fn collect_usage(&self, id: NodeId, prefix: &mut Vec<String>, out: &mut Vec<String>) {
        let node = self.node(id);
        if id != Self::ROOT {
            prefix.push(node.kind.usage());
        }
        if node.is_executable() {
            out.push(prefix.join(" "));
        }
        for &child in &node.children {
            self.collect_usage(child, prefix, out);
        }
        if id != Self::ROOT {
            prefix.pop();
        }
    }

    /// Checks the arena invariants: sibling literals are unique, sibling
    /// arguments are not ambiguous, and the child lists form a tree rooted at
    /// [`Self::ROOT`].
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen_child = HashSet::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let parent = NodeId(idx);
            let mut literals = HashSet::new();
            let mut arguments = HashSet::new();

            for &child in &node.children {
                let Some(c) = self.nodes.get(child.0) else {
                    return Err(TreeError::DanglingChild { parent, child });
                };
                if child == Self::ROOT || !seen_child.insert(child) {
                    return Err(TreeError::SharedChild(child));
                }
                match &c.kind {
                    NodeKind::Literal(name) => {
                        if !literals.insert(name.as_str()) {
                            return Err(TreeError::DuplicateLiteral {
                                parent,
                                name: name.clone(),
                            });
                        }
                    }
                    NodeKind::Argument { name, parser } => {
                        if !arguments.insert((name.as_str(), parser.parser_id())) {
                            return Err(TreeError::AmbiguousArgument {
                                parent,
                                name: name.clone(),
                                parser: parser.parser_id().to_string(),
                            });
                        }
                    }
                    NodeKind::Root => return Err(TreeError::SharedChild(child)),
                }
            }
        }

        // Every node but the root has exactly one parent.
        if let Some(orphan) = (1..self.nodes.len()).map(NodeId).find(|id| !seen_child.contains(id)) {
            return Err(TreeError::Unreachable(orphan));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let (kind, name, parser) = match &node.kind {
                    NodeKind::Root => ("root", None, None),
                    NodeKind::Literal(name) => ("literal", Some(name.clone()), None),
                    NodeKind::Argument { name, parser } => (
                        "argument",
                        Some(name.clone()),
                        Some(parser.parser_id().to_string()),
                    ),
                };
                NodeSnapshot {
                    id: NodeId(idx),
                    kind,
                    name,
                    parser,
                    executable: node.is_executable(),
                    children: node.children.clone(),
                }
            })
            .collect();
        TreeSnapshot { nodes }
    }
}

/// Serializable view of the arena, for dumping and inspection.
#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    pub executable: bool,
    pub children: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::path::{arg, lit};
    use crate::input::arguments::{double, string, word};

    fn ok(_: &CommandContext<'_, ()>) -> CommandResult {
        Ok(())
    }

    #[test]
    fn shared_prefixes_are_merged() {
        let mut tree = CommandTree::<()>::new();
        tree.register(vec![lit("friend"), lit("add"), arg("name", string())], ok)
            .unwrap();
        tree.register(vec![lit("friend"), lit("list")], ok).unwrap();

        // root, friend, add, <name>, list
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node(CommandTree::<()>::ROOT).children.len(), 1);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let mut tree = CommandTree::<()>::new();
        tree.register(vec![lit("status")], ok).unwrap();
        let err = tree.register(vec![lit("status")], ok).unwrap_err();
        assert_eq!(err.path, "status");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn override_policy_replaces_binding() {
        let mut tree = CommandTree::<()>::new();
        let a = tree.register(vec![lit("status")], ok).unwrap();
        let b = tree
            .register_with(vec![lit("status")], ok, BindingPolicy::Override)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn binding_an_intermediate_node_is_not_a_duplicate() {
        let mut tree = CommandTree::<()>::new();
        tree.register(vec![lit("waypoint"), lit("list"), arg("group", string())], ok)
            .unwrap();
        assert!(tree.register(vec![lit("waypoint"), lit("list")], ok).is_ok());
    }

    #[test]
    fn same_name_different_parser_are_siblings() {
        let mut tree = CommandTree::<()>::new();
        tree.register(vec![lit("remove"), arg("name", string())], ok).unwrap();
        tree.register(vec![lit("remove"), arg("name", word()), lit("from")], ok)
            .unwrap();
        let remove = tree.node(CommandTree::<()>::ROOT).children[0];
        assert_eq!(tree.node(remove).children.len(), 2);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn usage_lists_executable_paths() {
        let mut tree = CommandTree::<()>::new();
        tree.register(vec![lit("waypoint"), lit("add"), arg("name", string())], ok)
            .unwrap();
        tree.register(
            vec![
                lit("waypoint"),
                lit("add"),
                arg("name", string()),
                arg("x", double()),
            ],
            ok,
        )
        .unwrap();
        assert_eq!(
            tree.usage(),
            vec!["waypoint add <name>", "waypoint add <name> <x>"]
        );
    }

    #[test]
    fn snapshot_serializes() {
        let mut tree = CommandTree::<()>::new();
        tree.register(vec![lit("go"), arg("x", double())], ok).unwrap();
        let json = serde_json::to_value(tree.snapshot()).unwrap();
        assert_eq!(json["nodes"][0]["kind"], "root");
        assert_eq!(json["nodes"][1]["name"], "go");
        assert_eq!(json["nodes"][2]["parser"], "double");
        assert_eq!(json["nodes"][2]["executable"], true);
        assert_eq!(json["nodes"][0]["children"][0], 1);
    }
}
