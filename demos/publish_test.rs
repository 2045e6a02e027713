use serde::Serialize;
use service_bus_tools::{Message, SendOptions, ToolsPublisher};

#[derive(Serialize)]
struct TestLogged {
    service: String,
    message: String,
}

impl Message for TestLogged {
    fn message_type(&self) -> &str {
        "Tools.TestLogged"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_path = std::env::args().nth(1).unwrap_or_else(|| ".env".to_string());

    println!("Loading settings from {}...", env_path);
    let mut publisher = ToolsPublisher::from_env_file(&env_path)?;

    println!("Publishing test messages...");

    for i in 1..=5 {
        let message = TestLogged {
            service: "test-app".to_string(),
            message: format!("Test message {}", i),
        };

        let receipt = publisher
            .send_message(&message, SendOptions::new())
            .await?;

        println!("Published message {} ({})", i, receipt.message_id);
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    }

    println!("Done!");
    publisher.close().await?;
    Ok(())
}
