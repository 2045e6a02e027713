pub mod config;
pub mod encoder;
pub mod messaging;
pub mod metrics;
pub mod publisher;

pub use config::{ConfigError, PublisherConfig};
pub use encoder::{DynamicMessage, EncodeError, JsonMessageEncoder, Message, MessageEncoder};
pub use publisher::{BlockingPublisher, PublisherError, SendOptions, SendReceipt, ToolsPublisher};
