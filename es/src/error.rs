//! Event stream error types

use std::error::Error as StdError;
use std::io;
use std::num::ParseIntError;

use streamduct::StreamError;
use thiserror::Error;

use crate::event::EventRecord;

/// Errors that end an event stream
#[derive(Debug, Error)]
pub enum EventStreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid retry value {value:?}: {source}")]
    InvalidRetry {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Failed to decode {event_type:?} event as {target}: {source}")]
    Decode {
        event_type: String,
        target: String,
        #[source]
        source: DecodeError,
    },

    #[error("Partial event at end of stream: {0:?}")]
    PartialEvent(Box<EventRecord>),
}

impl From<EventStreamError> for StreamError {
    fn from(err: EventStreamError) -> Self {
        match err {
            EventStreamError::Io(e) => StreamError::from(e),
            other => StreamError::unexpected(other),
        }
    }
}

/// Failure of a [`Decoder`](crate::decode::Decoder)
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DecodeError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unsupported_content_type(content_type: &str) -> Self {
        Self::new(format!("Unsupported content type: {}", content_type))
    }
}
