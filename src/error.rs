use crate::dispatch::TreeError;
use crate::services::ServiceError;
use thiserror::Error;

pub type CommandResult = Result<(), CommandError>;

/// Errors raised by a bound action once its command line has resolved.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("argument {0} has an unexpected type")]
    ArgumentType(String),

    #[error("Collar is disconnected")]
    NotConnected,

    #[error("You are not in a world")]
    NotInWorld,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Registration-time programmer error: a path was bound twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command '{path}' is already bound")]
pub struct DuplicateBindingError {
    pub path: String,
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("invalid configuration: {0}")]
    Env(#[source] ConfigErrorKind),

    #[error(transparent)]
    Registration(#[from] DuplicateBindingError),

    #[error("invalid command tree: {0}")]
    InvalidTree(#[from] TreeError),
}
