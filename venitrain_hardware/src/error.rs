use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("transport read timeout")]
    Timeout,
    #[error("transport not open")]
    NotOpen,
    #[error("device error: {0}")]
    Device(String),
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaud(u32),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
