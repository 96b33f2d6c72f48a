//! Pub/sub demo for the realtime client.
//!
//! # Purpose
//! Demonstrates the end-to-end flow: boot an in-process harness server,
//! connect the client over a real WebSocket, subscribe to a channel, and
//! receive pushed publications.
//!
//! # Notes
//! This is a developer-facing demo; it favors clarity over performance.
use anyhow::{Context, Result};
use pylon_client::{ChannelEvent, Client, ClientConfig, StaticTokenProvider};
use pylon_harness::HarnessServer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

async fn run_demo() -> Result<()> {
    // Keep the demo output readable and step-by-step.
    println!("== Pylon Pub/Sub Demo ==");
    println!("Goal: demonstrate connect/subscribe/receive over WebSocket.");
    println!("This demo spins up an in-process server, then runs a client against it.");

    println!("Step 1/5: booting the in-process harness server.");
    let server = HarnessServer::spawn().await.context("spawn harness")?;
    println!("Listening on {}", server.url());

    println!("Step 2/5: connecting the client.");
    let config = ClientConfig::new(server.url()).with_access_token("demo-access");
    let client = Client::new(config);
    client.connect().await.context("connect")?;
    println!("Connection state: {:?}", client.state());

    println!("Step 3/5: subscribing to channel room.demo.");
    let subscription = client.create_channel(Arc::new(StaticTokenProvider::new(
        "room.demo",
        "demo-sub-token",
    )));
    let (event_tx, mut events) = mpsc::unbounded_channel();
    subscription.observe(move |event| {
        let _ = event_tx.send(event);
    });
    subscription.subscribe().await.context("subscribe")?;
    println!("Subscribed; epoch {}", subscription.epoch());

    println!("Step 4/5: pushing two messages through the server.");
    server.push("room.demo", "hello", 1)?;
    server.push("room.demo", "world", 2)?;
    let mut received = 0;
    while received < 2 {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .context("wait for publication")?
            .context("event feed closed")?;
        if let ChannelEvent::Publication { text, offset, .. } = event {
            println!("Received publication offset={offset}: {text}");
            received += 1;
        }
    }

    println!("Step 5/5: disconnecting.");
    client.disconnect().await;
    println!("Connection state: {:?}", client.state());
    println!("Demo complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    run_demo().await
}
