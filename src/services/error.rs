use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("collar is not connected")]
    NotConnected,

    #[error("could not connect: {0}")]
    Connect(String),

    #[error("no async runtime available")]
    NoRuntime,
}
