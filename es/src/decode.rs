//! Payload decoders

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::event::PayloadType;

/// Turns the data of an event into a value
pub trait Decoder: Send {
    type Output: Send + 'static;

    fn decode(&self, bytes: &[u8], payload_type: &PayloadType, content_type: &str)
    -> Result<Self::Output, DecodeError>;
}

/// Decodes payloads as UTF-8 text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl Decoder for TextDecoder {
    type Output = String;

    fn decode(&self, bytes: &[u8], _payload_type: &PayloadType, _content_type: &str) -> Result<String, DecodeError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError::with_source("Payload is not valid UTF-8", e))
    }
}

/// Decodes JSON payloads into `serde_json::Value`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    type Output = serde_json::Value;

    fn decode(
        &self,
        bytes: &[u8],
        _payload_type: &PayloadType,
        content_type: &str,
    ) -> Result<serde_json::Value, DecodeError> {
        decode_json(bytes, content_type)
    }
}

/// Decodes JSON payloads into `D`
pub struct TypedJsonDecoder<D> {
    _marker: PhantomData<fn() -> D>,
}

impl<D> TypedJsonDecoder<D> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<D> Default for TypedJsonDecoder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Decoder for TypedJsonDecoder<D>
where
    D: DeserializeOwned + Send + 'static,
{
    type Output = D;

    fn decode(&self, bytes: &[u8], _payload_type: &PayloadType, content_type: &str) -> Result<D, DecodeError> {
        decode_json(bytes, content_type)
    }
}

fn decode_json<D: DeserializeOwned>(bytes: &[u8], content_type: &str) -> Result<D, DecodeError> {
    if !is_json(content_type) {
        return Err(DecodeError::unsupported_content_type(content_type));
    }
    serde_json::from_slice(bytes).map_err(|e| DecodeError::with_source(format!("Invalid JSON: {}", e), e))
}

/// `application/json` or any `+json` media type, parameters ignored
pub fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Status {
        state: String,
        progress: u8,
    }

    fn schema() -> PayloadType {
        PayloadType::Schema("Status".to_string())
    }

    #[test]
    fn test_is_json() {
        assert!(is_json("application/json"));
        assert!(is_json("Application/JSON; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
        assert!(!is_json(""));
    }

    #[test]
    fn test_json_decoder() {
        let value = JsonDecoder
            .decode(br#"{"state":"running","progress":40}"#, &schema(), "application/json")
            .unwrap();
        assert_eq!(value["state"], "running");
        assert_eq!(value["progress"], 40);
    }

    #[test]
    fn test_typed_json_decoder() {
        let decoder = TypedJsonDecoder::<Status>::new();
        let status = decoder
            .decode(br#"{"state":"done","progress":100}"#, &schema(), "application/json")
            .unwrap();
        assert_eq!(
            status,
            Status {
                state: "done".to_string(),
                progress: 100
            }
        );
    }

    #[test]
    fn test_json_decoders_reject_other_content_types() {
        let err = JsonDecoder.decode(b"{}", &schema(), "text/plain").unwrap_err();
        assert!(err.to_string().contains("Unsupported content type"));
        assert!(TypedJsonDecoder::<Status>::new().decode(b"{}", &schema(), "text/csv").is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = TypedJsonDecoder::<Status>::new()
            .decode(b"{\"state\":", &schema(), "application/json")
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_text_decoder() {
        assert_eq!(TextDecoder.decode(b"hello", &PayloadType::Text, "text/plain").unwrap(), "hello");
        assert!(TextDecoder.decode(&[0xff, 0xfe], &PayloadType::Text, "text/plain").is_err());
    }
}
