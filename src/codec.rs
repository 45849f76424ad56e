//! # Codec Module
//!
//! Pluggable encode/decode for the two places where raw strings and bytes turn
//! into values during routing:
//!
//! - **Header and query values** are decoded by a [`ValueKind`] attached to each
//!   declared parameter (`integer`, `boolean`, comma-separated lists, ...).
//! - **Request and response bodies** are decoded and encoded by a [`MediaCodec`]
//!   looked up by media type in a [`CodecRegistry`].
//!
//! The router consults these codecs but they never call back into the router.
//! Every decoded value is a `serde_json::Value`, so handlers see one uniform
//! representation regardless of the wire format.

use crate::negotiation::MediaType;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Failure to decode or encode a header, query value or body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CodecError {}

/// User-supplied decoder for a header or query value.
pub trait ValueCodec: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Value, CodecError>;

    fn encode(&self, value: &Value) -> String {
        encode_value(value)
    }
}

/// How a declared header or query parameter is decoded.
#[derive(Clone)]
pub enum ValueKind {
    Text,
    Integer,
    Number,
    Boolean,
    /// Comma-separated items, each decoded with the inner kind.
    List(Box<ValueKind>),
    Json,
    Custom(Arc<dyn ValueCodec>),
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => write!(f, "Text"),
            ValueKind::Integer => write!(f, "Integer"),
            ValueKind::Number => write!(f, "Number"),
            ValueKind::Boolean => write!(f, "Boolean"),
            ValueKind::List(inner) => write!(f, "List({inner:?})"),
            ValueKind::Json => write!(f, "Json"),
            ValueKind::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl ValueKind {
    /// Decode a raw header or query value.
    pub fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        match self {
            ValueKind::Text => Ok(Value::String(raw.to_string())),
            ValueKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| CodecError::new(format!("expected an integer, got `{raw}`"))),
            ValueKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| CodecError::new(format!("expected a number, got `{raw}`"))),
            ValueKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(CodecError::new(format!("expected a boolean, got `{raw}`"))),
            },
            ValueKind::List(item) => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| item.decode(part))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ValueKind::Json => serde_json::from_str(raw)
                .map_err(|e| CodecError::new(format!("invalid JSON value: {e}"))),
            ValueKind::Custom(codec) => codec.decode(raw),
        }
    }

    /// Decode a query key that appeared without `=`.
    pub fn decode_flag(&self) -> Result<Value, CodecError> {
        match self {
            ValueKind::Boolean => Ok(Value::Bool(true)),
            ValueKind::Text => Ok(Value::String(String::new())),
            ValueKind::List(_) => Ok(Value::Array(Vec::new())),
            ValueKind::Custom(codec) => codec.decode(""),
            _ => Err(CodecError::new("expected a value")),
        }
    }

    #[must_use]
    pub fn encode(&self, value: &Value) -> String {
        match self {
            ValueKind::Custom(codec) => codec.encode(value),
            _ => encode_value(value),
        }
    }
}

/// Render a value the way it travels in a header: strings verbatim, lists
/// comma-joined, everything else as compact JSON.
#[must_use]
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(encode_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Encoder/decoder for one body media type.
pub trait MediaCodec: Send + Sync {
    /// The concrete media type handled, e.g. `application/json`.
    fn media_type(&self) -> &str;

    fn decode(&self, body: &[u8]) -> Result<Value, CodecError>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;
}

pub struct JsonCodec;

impl MediaCodec for JsonCodec {
    fn media_type(&self) -> &str {
        "application/json"
    }

    fn decode(&self, body: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(body).map_err(|e| CodecError::new(format!("invalid JSON body: {e}")))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::new(e.to_string()))
    }
}

pub struct TextCodec;

impl MediaCodec for TextCodec {
    fn media_type(&self) -> &str {
        "text/plain"
    }

    fn decode(&self, body: &[u8]) -> Result<Value, CodecError> {
        std::str::from_utf8(body)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| CodecError::new(format!("body is not valid UTF-8: {e}")))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(match value {
            Value::String(s) => s.clone().into_bytes(),
            Value::Null => Vec::new(),
            other => other.to_string().into_bytes(),
        })
    }
}

/// `application/x-www-form-urlencoded`, decoded into a flat object of strings.
pub struct FormCodec;

impl MediaCodec for FormCodec {
    fn media_type(&self) -> &str {
        "application/x-www-form-urlencoded"
    }

    fn decode(&self, body: &[u8]) -> Result<Value, CodecError> {
        let fields: Map<String, Value> = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        Ok(Value::Object(fields))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let Value::Object(fields) = value else {
            return Err(CodecError::new("form bodies must be objects"));
        };
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, field) in fields {
            serializer.append_pair(key, &encode_value(field));
        }
        Ok(serializer.finish().into_bytes())
    }
}

pub struct YamlCodec;

impl MediaCodec for YamlCodec {
    fn media_type(&self) -> &str {
        "application/yaml"
    }

    fn decode(&self, body: &[u8]) -> Result<Value, CodecError> {
        serde_yaml::from_slice(body).map_err(|e| CodecError::new(format!("invalid YAML body: {e}")))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::new(e.to_string()))
    }
}

/// Media codecs keyed by media type essence (`type/subtype`, lower-case).
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<(String, Arc<dyn MediaCodec>)>,
}

impl Default for CodecRegistry {
    /// JSON, plain text, url-encoded forms and YAML.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(JsonCodec));
        registry.register(Arc::new(TextCodec));
        registry.register(Arc::new(FormCodec));
        registry.register(Arc::new(YamlCodec));
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|(essence, _)| essence))
            .finish()
    }
}

fn essence_of(media_type: &str) -> Option<String> {
    MediaType::parse(media_type).ok().map(|mt| mt.essence())
}

impl CodecRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Add a codec, replacing any codec already registered for the same media type.
    pub fn register(&mut self, codec: Arc<dyn MediaCodec>) {
        let essence =
            essence_of(codec.media_type()).unwrap_or_else(|| codec.media_type().to_ascii_lowercase());
        if let Some(slot) = self.codecs.iter_mut().find(|(e, _)| *e == essence) {
            debug!(media_type = %essence, "Replacing registered media codec");
            slot.1 = codec;
        } else {
            self.codecs.push((essence, codec));
        }
    }

    /// Codec for a media type; parameters such as `charset` are ignored.
    #[must_use]
    pub fn find(&self, media_type: &str) -> Option<&Arc<dyn MediaCodec>> {
        let essence = essence_of(media_type)?;
        self.codecs
            .iter()
            .find(|(e, _)| *e == essence)
            .map(|(_, codec)| codec)
    }

    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.codecs.iter().map(|(e, _)| e.as_str())
    }
}
