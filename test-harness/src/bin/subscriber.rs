// Test harness subscriber: connects to a live endpoint and counts pushes.
use anyhow::{Context, Result};
use clap::Parser;
use pylon_client::{ChannelEvent, Client, ClientConfig, StaticTokenProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "subscriber")]
#[command(about = "Test harness subscriber for the pylon realtime client")]
struct Args {
    /// WebSocket endpoint URL
    #[arg(long, default_value = "ws://127.0.0.1:8000/connection/websocket")]
    address: String,

    /// Connection access token
    #[arg(long, default_value = "harness-access")]
    access_token: String,

    /// Channel to subscribe to
    #[arg(long, default_value = "test-channel")]
    channel: String,

    /// Channel subscription token
    #[arg(long, default_value = "harness-sub")]
    channel_token: String,

    /// Subscriber ID for logging
    #[arg(long, default_value = "sub-1")]
    id: String,

    /// Timeout for receiving messages in seconds (0 = no timeout)
    #[arg(long, default_value = "60")]
    timeout: u64,
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
        "Starting subscriber"
    );

    let config = ClientConfig::from_env_or_yaml(&args.address, None)?
        .with_access_token(&args.access_token);
    let client = Client::new(config);
    client.connect().await.context("connect")?;
    info!(id = %args.id, "Connected");

    let subscription = client.create_channel(Arc::new(StaticTokenProvider::new(
        &args.channel,
        &args.channel_token,
    )));
    let (event_tx, mut events) = mpsc::unbounded_channel();
    subscription.observe(move |event| {
        let _ = event_tx.send(event);
    });
    subscription.subscribe().await.context("subscribe")?;
    info!(id = %args.id, "Subscribed");

    let start_time = Instant::now();
    let mut received = 0u64;
    let timeout_duration = if args.timeout > 0 {
        Some(Duration::from_secs(args.timeout))
    } else {
        None
    };

    loop {
        let event = if let Some(timeout_dur) = timeout_duration {
            match timeout(timeout_dur, events.recv()).await {
                Ok(event) => event,
                Err(_) => {
                    warn!(id = %args.id, "Timeout waiting for event, stopping");
                    break;
                }
            }
        } else {
            events.recv().await
        };
        match event {
            Some(ChannelEvent::Publication { text, offset, .. }) => {
                received += 1;
                if received % 1000 == 0 {
                    let rate = received as f64 / start_time.elapsed().as_secs_f64();
                    info!(
                        id = %args.id,
                        received,
                        offset,
                        rate = format!("{rate:.2}"),
                        payload_size = text.len(),
                        "Receiving progress"
                    );
                }
            }
            Some(ChannelEvent::Kicked) => {
                warn!(id = %args.id, "Kicked by the server, stopping");
                break;
            }
            Some(ChannelEvent::StateChanged(state)) => {
                info!(id = %args.id, state = state.as_str(), "Subscription state changed");
            }
            Some(ChannelEvent::Failed(reason)) => {
                warn!(id = %args.id, reason = %reason, "Subscription failed");
            }
            None => break,
        }
    }

    info!(id = %args.id, received, "Subscriber done");
    client.disconnect().await;
    Ok(())
}
