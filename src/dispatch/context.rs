use crate::error::CommandError;
use crate::input::arguments::ArgValue;
use std::any::Any;
use std::collections::HashMap;

/// Parsed arguments for one dispatch, plus the source that issued it.
pub struct CommandContext<'a, S> {
    source: S,
    input: &'a str,
    arguments: HashMap<String, ArgValue>,
}

impl<'a, S> CommandContext<'a, S> {
    pub(crate) fn new(source: S, input: &'a str, arguments: HashMap<String, ArgValue>) -> Self {
        Self {
            source,
            input,
            arguments,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The full command line as typed.
    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn has(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<&T, CommandError> {
        let value = self
            .arguments
            .get(name)
            .ok_or_else(|| CommandError::MissingArgument(name.to_string()))?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| CommandError::ArgumentType(name.to_string()))
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for CommandContext<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.arguments.keys().collect();
        names.sort();
        f.debug_struct("CommandContext")
            .field("source", &self.source)
            .field("input", &self.input)
            .field("arguments", &names)
            .finish()
    }
}
