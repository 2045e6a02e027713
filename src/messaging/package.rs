use std::collections::BTreeMap;
use std::time::Duration;

pub const TRACE_HEADER: &str = "X-SERVICE-BUS-TRACE-ID";
pub const ENCODER_HEADER: &str = "X-SERVICE-BUS-ENCODER";

/// Exchange + routing key pair. An empty topic addresses the default exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub topic: String,
    pub routing_key: String,
}

impl Destination {
    pub fn new(topic: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            routing_key: routing_key.into(),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topic = if self.topic.is_empty() {
            "(default)"
        } else {
            self.topic.as_str()
        };
        write!(f, "{} -> {}", topic, self.routing_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundPackage {
    pub payload: Vec<u8>,
    pub headers: BTreeMap<String, String>,
    pub destination: Destination,
    pub message_id: String,
    pub content_type: Option<String>,
    pub persistent: bool,
    pub mandatory: bool,
    pub expire_after: Option<Duration>,
}

impl OutboundPackage {
    pub fn new(
        payload: Vec<u8>,
        headers: BTreeMap<String, String>,
        destination: Destination,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            payload,
            headers,
            destination,
            message_id: message_id.into(),
            content_type: None,
            persistent: false,
            mandatory: false,
            expire_after: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn with_expire_after(mut self, expire_after: Option<Duration>) -> Self {
        self.expire_after = expire_after;
        self
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.headers.get(TRACE_HEADER).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_defaults() {
        let mut headers = BTreeMap::new();
        headers.insert(TRACE_HEADER.to_string(), "trace-1".to_string());

        let package = OutboundPackage::new(
            b"{}".to_vec(),
            headers,
            Destination::new("orders", "orders.created"),
            "msg-1",
        );

        assert_eq!(package.trace_id(), Some("trace-1"));
        assert_eq!(package.message_id, "msg-1");
        assert!(!package.persistent);
        assert!(!package.mandatory);
        assert!(package.expire_after.is_none());
        assert!(package.content_type.is_none());
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(Destination::new("orders", "created").to_string(), "orders -> created");
        assert_eq!(Destination::new("", "telemetry").to_string(), "(default) -> telemetry");
    }
}
