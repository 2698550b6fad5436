use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrainerError {
    #[error("step id {id} out of range (expected 1..={max})")]
    StepOutOfRange { id: u8, max: u8 },
    #[error("unknown sub-step id: {0}")]
    UnknownSubStep(String),
    #[error("transport not connected")]
    NotConnected,
    #[error("transport already connected")]
    AlreadyConnected,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("transport read timed out")]
    Timeout,
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing transport")]
    MissingTransport,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
