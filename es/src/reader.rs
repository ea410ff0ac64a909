//! Event-stream reader
//!
//! [`EventStreamReader`] reads lines from an async byte stream and assembles
//! them into [`ServerSentEvent`]s. Wrapped in a [`PullSource`] it becomes an
//! [`EventSource`], which can be consumed directly or activated to read
//! ahead on its own task.

use async_trait::async_trait;
use streamduct::{ItemReader, PullSource, StreamError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::decode::{Decoder, TextDecoder};
use crate::error::EventStreamError;
use crate::event::{EventRecord, Payload, PayloadType, ServerSentEvent};
use crate::parser::{Line, parse_line};
use crate::resolve::{EventTypeResolver, TextResolver};

/// A [`streamduct::Source`] of server-sent events
pub type EventSource<R, Res = TextResolver, D = TextDecoder> = PullSource<EventStreamReader<R, Res, D>>;

/// Reads events from `reader`, keeping every payload as text
pub fn event_source<R>(reader: R) -> EventSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    EventStreamReader::new(reader).into_source()
}

/// Assembles events from a line-oriented byte stream
pub struct EventStreamReader<R, Res = TextResolver, D = TextDecoder> {
    reader: R,
    resolver: Res,
    decoder: D,
    origin: String,
    line: String,
    events_read: u64,
}

impl<R> EventStreamReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_parts(reader, TextResolver, TextDecoder)
    }
}

impl<R, Res, D> EventStreamReader<R, Res, D>
where
    R: AsyncBufRead + Unpin + Send,
    Res: EventTypeResolver,
    D: Decoder,
{
    pub fn with_parts(reader: R, resolver: Res, decoder: D) -> Self {
        Self {
            reader,
            resolver,
            decoder,
            origin: "stream".to_string(),
            line: String::new(),
            events_read: 0,
        }
    }

    /// Label used in log output and the source name, e.g. the request URL
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn resolver<Res2: EventTypeResolver>(self, resolver: Res2) -> EventStreamReader<R, Res2, D> {
        EventStreamReader {
            reader: self.reader,
            resolver,
            decoder: self.decoder,
            origin: self.origin,
            line: self.line,
            events_read: self.events_read,
        }
    }

    pub fn decoder<D2: Decoder>(self, decoder: D2) -> EventStreamReader<R, Res, D2> {
        EventStreamReader {
            reader: self.reader,
            resolver: self.resolver,
            decoder,
            origin: self.origin,
            line: self.line,
            events_read: self.events_read,
        }
    }

    pub fn events_read(&self) -> u64 {
        self.events_read
    }

    pub fn into_source(self) -> PullSource<Self> {
        let name = format!("EventSource[{}]", self.origin);
        PullSource::named(self, name)
    }

    /// Read the next event, `Ok(None)` at a clean end of stream
    pub async fn next_event(&mut self) -> Result<Option<ServerSentEvent<D::Output>>, EventStreamError> {
        let mut record = EventRecord::default();
        let mut seen = false;

        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line).await? == 0 {
                if seen {
                    debug!(origin = %self.origin, ?record, "EventStreamReader::next_event: partial event at end");
                    return Err(EventStreamError::PartialEvent(Box::new(record)));
                }
                debug!(origin = %self.origin, events = self.events_read, "EventStreamReader::next_event: end of stream");
                return Ok(None);
            }

            match parse_line(&self.line) {
                Line::Blank if seen => return self.dispatch(record).map(Some),
                Line::Blank | Line::Comment => {}
                Line::Field { name, value } => {
                    seen = true;
                    record.apply(name, value)?;
                }
            }
        }
    }

    fn dispatch(&mut self, record: EventRecord) -> Result<ServerSentEvent<D::Output>, EventStreamError> {
        let event_type = record.event_type();
        let payload_type = self.resolver.resolve_type(event_type);
        let content_type = self.resolver.resolve_content_type(event_type);
        debug!(
            origin = %self.origin,
            event_type,
            %payload_type,
            %content_type,
            "EventStreamReader::dispatch: called"
        );

        let data = match (&payload_type, record.data.as_deref()) {
            (PayloadType::Text, data) => Some(Payload::Text(data.unwrap_or_default().to_string())),
            (PayloadType::Schema(_), None | Some("")) => None,
            (PayloadType::Schema(target), Some(data)) => {
                let value = self
                    .decoder
                    .decode(data.as_bytes(), &payload_type, &content_type)
                    .map_err(|source| EventStreamError::Decode {
                        event_type: event_type.to_string(),
                        target: target.clone(),
                        source,
                    })?;
                Some(Payload::Decoded(value))
            }
        };

        self.events_read += 1;
        Ok(ServerSentEvent {
            event: record.event,
            id: record.id,
            retry: record.retry,
            data,
        })
    }
}

#[async_trait]
impl<R, Res, D> ItemReader for EventStreamReader<R, Res, D>
where
    R: AsyncBufRead + Unpin + Send,
    Res: EventTypeResolver,
    D: Decoder,
{
    type Item = ServerSentEvent<D::Output>;

    async fn read_item(&mut self) -> Result<Option<Self::Item>, StreamError> {
        self.next_event().await.map_err(StreamError::from)
    }

    async fn release(&mut self) {
        debug!(origin = %self.origin, events = self.events_read, "EventStreamReader::release: called");
    }
}
