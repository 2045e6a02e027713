pub mod channel;
pub mod connection;
pub mod package;
pub mod transport;

pub use channel::{ChannelError, ChannelProvider};
pub use connection::{AmqpConnectionConfiguration, ConnectionError, RabbitMqConnection};
pub use package::{Destination, OutboundPackage, ENCODER_HEADER, TRACE_HEADER};
pub use transport::{AmqpTransport, AmqpTransportFactory, Transport, TransportError, TransportFactory};
