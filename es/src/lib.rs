//! streamduct-sse - Server-Sent Events as a streamduct source
//!
//! Parses the `text/event-stream` format from any async byte stream:
//!
//! - `event: <type>` sets the event type
//! - `data: <payload>` appends a payload line
//! - `id: <id>` and `retry: <millis>` set event metadata
//! - `:` starts a comment
//! - a blank line ends the event
//!
//! Each event type resolves to a payload type and content type; payloads
//! that are not plain text go through a [`Decoder`]. A stream that ends in
//! the middle of an event, or a payload that cannot be decoded, fails the
//! source.
//!
//! # Modules
//!
//! - [`reader`] - Event assembly and the `EventSource` type
//! - [`parser`] - Line classification
//! - [`resolve`] / [`decode`] - Payload interpretation
//! - [`config`] - Configuration for the configured resolver

pub mod config;
pub mod decode;
pub mod error;
pub mod event;
pub mod parser;
pub mod reader;
pub mod resolve;

// Re-export commonly used types
pub use config::EventStreamConfig;
pub use decode::{Decoder, JsonDecoder, TextDecoder, TypedJsonDecoder};
pub use error::{DecodeError, EventStreamError};
pub use event::{EventRecord, Payload, PayloadType, ServerSentEvent};
pub use reader::{EventSource, EventStreamReader, event_source};
pub use resolve::{ConfiguredResolver, EventTypeResolver, FnResolver, TextResolver};
