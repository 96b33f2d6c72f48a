// Test harness publisher: connects to a live endpoint and publishes at a
// fixed rate.
use anyhow::{Context, Result};
use clap::Parser;
use pylon_client::{Client, ClientConfig};
use std::time::Instant;
use tokio::time::{Duration, sleep};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "publisher")]
#[command(about = "Test harness publisher for the pylon realtime client")]
struct Args {
    /// WebSocket endpoint URL
    #[arg(long, default_value = "ws://127.0.0.1:8000/connection/websocket")]
    address: String,

    /// Connection access token
    #[arg(long, default_value = "harness-access")]
    access_token: String,

    /// Channel to publish to
    #[arg(long, default_value = "test-channel")]
    channel: String,

    /// Number of messages to publish
    #[arg(long, default_value = "1000")]
    count: u64,

    /// Delay between messages in milliseconds
    #[arg(long, default_value = "10")]
    interval_ms: u64,

    /// Publisher ID for logging
    #[arg(long, default_value = "pub-1")]
    id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(
        id = %args.id,
        address = %args.address,
        channel = %args.channel,
        count = args.count,
        "Starting publisher"
    );

    let config = ClientConfig::from_env_or_yaml(&args.address, None)?
        .with_access_token(&args.access_token);
    let client = Client::new(config);
    client.connect().await.context("connect")?;
    info!(id = %args.id, "Connected");

    let start_time = Instant::now();
    let mut published = 0u64;
    let mut errors = 0u64;
    for sequence in 0..args.count {
        let payload = format!("{}:{}", args.id, sequence);
        match client.publish(&args.channel, payload).await {
            Ok(()) => published += 1,
            Err(err) => {
                errors += 1;
                if errors % 100 == 1 {
                    error!(id = %args.id, error = %err, errors, "Publish error");
                }
            }
        }
        if published % 1000 == 0 && published > 0 {
            let rate = published as f64 / start_time.elapsed().as_secs_f64();
            info!(id = %args.id, published, errors, rate = format!("{rate:.2}"), "Publishing progress");
        }
        if args.interval_ms > 0 {
            sleep(Duration::from_millis(args.interval_ms)).await;
        }
    }

    info!(id = %args.id, published, errors, "Publisher done");
    client.disconnect().await;
    Ok(())
}
