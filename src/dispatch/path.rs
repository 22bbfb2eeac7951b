use crate::input::arguments::{ArgumentParser, DynParser};
use std::sync::Arc;

/// One step of a command path, as handed to [`CommandTree::register`].
///
/// [`CommandTree::register`]: crate::dispatch::CommandTree::register
#[derive(Clone)]
pub enum NodeSpec {
    Literal(String),
    Argument {
        name: String,
        parser: Arc<dyn DynParser>,
    },
}

impl NodeSpec {
    pub fn name(&self) -> &str {
        match self {
            NodeSpec::Literal(name) => name,
            NodeSpec::Argument { name, .. } => name,
        }
    }

    /// `add` for literals, `<name>` for arguments.
    pub fn usage(&self) -> String {
        match self {
            NodeSpec::Literal(name) => name.clone(),
            NodeSpec::Argument { name, .. } => format!("<{name}>"),
        }
    }
}

impl std::fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeSpec::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            NodeSpec::Argument { name, parser } => f
                .debug_struct("Argument")
                .field("name", name)
                .field("parser", &parser.parser_id())
                .finish(),
        }
    }
}

pub fn lit(name: impl Into<String>) -> NodeSpec {
    NodeSpec::Literal(name.into())
}

pub fn arg<P: ArgumentParser>(name: impl Into<String>, parser: P) -> NodeSpec {
    NodeSpec::Argument {
        name: name.into(),
        parser: Arc::new(parser),
    }
}

/// Builds a path under an optional leading literal (e.g. `collar`).
pub fn prefixed(prefix: Option<&str>, rest: impl IntoIterator<Item = NodeSpec>) -> Vec<NodeSpec> {
    prefix.map(lit).into_iter().chain(rest).collect()
}

pub fn usage_of(path: &[NodeSpec]) -> String {
    path.iter().map(NodeSpec::usage).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::arguments::double;

    #[test]
    fn prefix_is_prepended() {
        let p = prefixed(Some("collar"), [lit("waypoint"), arg("x", double())]);
        assert_eq!(usage_of(&p), "collar waypoint <x>");

        let p = prefixed(None, [lit("waypoint")]);
        assert_eq!(usage_of(&p), "waypoint");
    }
}
