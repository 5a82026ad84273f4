//! Shared error types for the load contention harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Channel closed: {channel}")]
    ChannelClosed { channel: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
