//! Event records and finished events

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::error::EventStreamError;

/// Fields accumulated for the event currently being read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub event: Option<String>,
    pub data: Option<String>,
    pub id: Option<String>,
    pub retry: Option<Duration>,
}

impl EventRecord {
    /// Apply one `field: value` line
    ///
    /// Repeated `data` lines are joined with `\n`. Unknown fields are ignored.
    pub fn apply(&mut self, field: &str, value: &str) -> Result<(), EventStreamError> {
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" => self.id = Some(value.to_string()),
            "retry" => {
                let millis = value.parse::<u64>().map_err(|source| EventStreamError::InvalidRetry {
                    value: value.to_string(),
                    source,
                })?;
                self.retry = Some(Duration::from_millis(millis));
            }
            other => debug!(field = %other, "EventRecord::apply: ignoring unknown field"),
        }
        Ok(())
    }

    /// Event type name used for payload resolution; empty when not set
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or("")
    }
}

/// Target of payload decoding for an event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadType {
    /// Keep the data as text
    Text,
    /// Decode the data into a named schema
    Schema(String),
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadType::Text => write!(f, "text"),
            PayloadType::Schema(name) => write!(f, "{}", name),
        }
    }
}

/// Event payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<O> {
    Text(String),
    Decoded(O),
}

/// A finished event
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSentEvent<O> {
    pub event: Option<String>,
    pub id: Option<String>,
    pub retry: Option<Duration>,
    pub data: Option<Payload<O>>,
}

impl<O> ServerSentEvent<O> {
    /// The payload if it was kept as text
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            Some(Payload::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// The payload if it was decoded
    pub fn decoded(&self) -> Option<&O> {
        match &self.data {
            Some(Payload::Decoded(value)) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_fields() {
        let mut record = EventRecord::default();
        record.apply("event", "update").unwrap();
        record.apply("id", "42").unwrap();
        record.apply("retry", "1500").unwrap();
        record.apply("data", "line one").unwrap();
        record.apply("data", "line two").unwrap();
        record.apply("x-custom", "ignored").unwrap();

        assert_eq!(record.event_type(), "update");
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.retry, Some(Duration::from_millis(1500)));
        assert_eq!(record.data.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_invalid_retry() {
        let mut record = EventRecord::default();
        let err = record.apply("retry", "soon").unwrap_err();
        match err {
            EventStreamError::InvalidRetry { value, .. } => assert_eq!(value, "soon"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(record.retry.is_none());
    }

    #[test]
    fn test_empty_event_type() {
        assert_eq!(EventRecord::default().event_type(), "");
    }

    #[test]
    fn test_payload_accessors() {
        let event: ServerSentEvent<u8> = ServerSentEvent {
            event: None,
            id: None,
            retry: None,
            data: Some(Payload::Text("hi".to_string())),
        };
        assert_eq!(event.text(), Some("hi"));
        assert_eq!(event.decoded(), None);

        let decoded = ServerSentEvent {
            data: Some(Payload::Decoded(7u8)),
            ..event
        };
        assert_eq!(decoded.decoded(), Some(&7));
        assert_eq!(decoded.text(), None);
    }
}
