//! Per-event-type payload resolution

use std::collections::HashSet;

use crate::config::EventStreamConfig;
use crate::event::PayloadType;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Decides how the data of each event type is interpreted
pub trait EventTypeResolver: Send {
    fn resolve_type(&self, event_type: &str) -> PayloadType;

    fn resolve_content_type(&self, event_type: &str) -> String;
}

/// Keeps every payload as `text/plain`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResolver;

impl EventTypeResolver for TextResolver {
    fn resolve_type(&self, _event_type: &str) -> PayloadType {
        PayloadType::Text
    }

    fn resolve_content_type(&self, _event_type: &str) -> String {
        TEXT_PLAIN.to_string()
    }
}

/// Resolver built from two closures
pub struct FnResolver<F, G> {
    type_fn: F,
    content_type_fn: G,
}

impl<F, G> FnResolver<F, G>
where
    F: Fn(&str) -> PayloadType + Send,
    G: Fn(&str) -> String + Send,
{
    pub fn new(type_fn: F, content_type_fn: G) -> Self {
        Self {
            type_fn,
            content_type_fn,
        }
    }
}

impl<F, G> EventTypeResolver for FnResolver<F, G>
where
    F: Fn(&str) -> PayloadType + Send,
    G: Fn(&str) -> String + Send,
{
    fn resolve_type(&self, event_type: &str) -> PayloadType {
        (self.type_fn)(event_type)
    }

    fn resolve_content_type(&self, event_type: &str) -> String {
        (self.content_type_fn)(event_type)
    }
}

/// Resolver driven by [`EventStreamConfig`]
///
/// Event types listed in `json-events` (or all of them, with `*`) decode as
/// JSON; the rest stay text with the configured default content type.
#[derive(Debug, Clone)]
pub struct ConfiguredResolver {
    default_content_type: String,
    json_events: HashSet<String>,
    all_json: bool,
}

impl ConfiguredResolver {
    pub fn new(config: &EventStreamConfig) -> Self {
        Self {
            default_content_type: config.default_content_type.clone(),
            json_events: config.json_events.iter().cloned().collect(),
            all_json: config.json_events.iter().any(|e| e == "*"),
        }
    }

    fn is_json(&self, event_type: &str) -> bool {
        self.all_json || self.json_events.contains(event_type)
    }
}

impl From<&EventStreamConfig> for ConfiguredResolver {
    fn from(config: &EventStreamConfig) -> Self {
        Self::new(config)
    }
}

impl EventTypeResolver for ConfiguredResolver {
    fn resolve_type(&self, event_type: &str) -> PayloadType {
        if self.is_json(event_type) {
            PayloadType::Schema(if event_type.is_empty() {
                "message".to_string()
            } else {
                event_type.to_string()
            })
        } else {
            PayloadType::Text
        }
    }

    fn resolve_content_type(&self, event_type: &str) -> String {
        if self.is_json(event_type) {
            APPLICATION_JSON.to_string()
        } else {
            self.default_content_type.clone()
        }
    }
}
