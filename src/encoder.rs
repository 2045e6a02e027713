use serde::Serialize;

pub const JSON_ENCODER_NAME: &str = "service_bus.encoder.json";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Anything that can be put on the bus.
pub trait Message: Serialize {
    /// Name the consumer uses to pick a deserialization target.
    fn message_type(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

pub trait MessageEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn content_type(&self) -> &'static str;

    fn encode<M: Message>(&self, message: &M) -> Result<Vec<u8>, EncodeError>;
}

#[derive(Serialize)]
struct JsonEnvelope<'a, M: Serialize> {
    message: &'a M,
    namespace: &'a str,
}

/// Wraps the payload as `{"message": ..., "namespace": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMessageEncoder;

impl MessageEncoder for JsonMessageEncoder {
    fn name(&self) -> &'static str {
        JSON_ENCODER_NAME
    }

    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn encode<M: Message>(&self, message: &M) -> Result<Vec<u8>, EncodeError> {
        let message_type = message.message_type();

        serde_json::to_vec(&JsonEnvelope {
            message,
            namespace: message_type,
        })
        .map_err(|e| EncodeError::EncodeFailed {
            message_type: message_type.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Message assembled at runtime, e.g. from command line input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DynamicMessage {
    #[serde(skip)]
    message_type: String,
    payload: serde_json::Value,
}

impl DynamicMessage {
    pub fn new(message_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
        }
    }

    pub fn from_json(message_type: impl Into<String>, json: &str) -> Result<Self, EncodeError> {
        let message_type = message_type.into();
        let payload = serde_json::from_str(json).map_err(|e| EncodeError::InvalidPayload {
            message_type: message_type.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(message_type, payload))
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl Message for DynamicMessage {
    fn message_type(&self) -> &str {
        &self.message_type
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to encode message {message_type}: {reason}")]
    EncodeFailed { message_type: String, reason: String },

    #[error("Invalid JSON payload for message {message_type}: {reason}")]
    InvalidPayload { message_type: String, reason: String },
}
