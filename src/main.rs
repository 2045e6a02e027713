use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use service_bus_tools::messaging::AmqpTransportFactory;
use service_bus_tools::{
    BlockingPublisher, DynamicMessage, JsonMessageEncoder, PublisherConfig, SendOptions,
    ToolsPublisher,
};

#[derive(Parser)]
#[command(name = "tools-publish")]
#[command(about = "Publish a single message to the service bus (tests/debug only)")]
struct Cli {
    /// Environment file with the sender and transport settings
    #[arg(short, long, default_value = ".env")]
    env: PathBuf,

    /// Message type, written to the envelope namespace
    #[arg(short = 't', long = "type")]
    message_type: String,

    /// Override SENDER_DESTINATION_TOPIC
    #[arg(long)]
    topic: Option<String>,

    /// Override SENDER_DESTINATION_TOPIC_ROUTING_KEY
    #[arg(long)]
    routing_key: Option<String>,

    #[arg(long)]
    trace_id: Option<String>,

    /// Ask the broker to store the message on disk
    #[arg(long)]
    persistent: bool,

    /// Fail if the message cannot be routed to any queue
    #[arg(long)]
    mandatory: bool,

    /// Per-message TTL in milliseconds
    #[arg(long)]
    expire_ms: Option<u64>,

    /// Inline JSON, or @path to a JSON file
    payload: String,
}

impl Cli {
    fn send_options(&self) -> SendOptions {
        let mut options = SendOptions::new()
            .persistent(self.persistent)
            .mandatory(self.mandatory);

        if let Some(trace_id) = &self.trace_id {
            options = options.trace_id(trace_id);
        }
        if let Some(topic) = &self.topic {
            options = options.topic(topic);
        }
        if let Some(routing_key) = &self.routing_key {
            options = options.routing_key(routing_key);
        }
        if let Some(ms) = self.expire_ms {
            options = options.expire_after(Duration::from_millis(ms));
        }

        options
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match PublisherConfig::from_env_file(&cli.env) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    setup_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env_file = %cli.env.display(),
        "Tools publisher starting"
    );

    let json = match read_payload(&cli.payload) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to read payload {}: {}", cli.payload, e);
            std::process::exit(1);
        }
    };

    let message = match DynamicMessage::from_json(cli.message_type.clone(), &json) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut publisher = match ToolsPublisher::with_components(
        config,
        JsonMessageEncoder,
        AmqpTransportFactory,
    )
    .and_then(BlockingPublisher::new)
    {
        Ok(publisher) => publisher,
        Err(e) => {
            eprintln!("Failed to create publisher: {}", e);
            std::process::exit(1);
        }
    };

    let receipt = match publisher.send_message(&message, cli.send_options()) {
        Ok(receipt) => receipt,
        Err(e) => {
            eprintln!("Failed to send message: {}", e);
            std::process::exit(1);
        }
    };

    println!("message_id:  {}", receipt.message_id);
    println!("trace_id:    {}", receipt.trace_id);
    println!("destination: {}", receipt.destination);
    println!("size:        {} bytes", receipt.payload_size);

    if let Ok(metrics) = publisher.publisher().metrics().render() {
        debug!(metrics = %metrics, "Publisher metrics");
    }

    if let Err(e) = publisher.close() {
        eprintln!("Error during shutdown: {}", e);
    }

    info!("Tools publisher stopped");
}

fn read_payload(arg: &str) -> std::io::Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(arg.to_string()),
    }
}

fn setup_logging(rust_log: &str) {
    let log_level = match rust_log.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}
