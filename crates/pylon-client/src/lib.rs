//! Realtime messaging client: server-pushed events over a single
//! multiplexed WebSocket connection speaking a JSON command/reply protocol.
//!
//! The client keeps its subscription set alive across network disruptions:
//! reconnects run on an exponential backoff, the handshake carries recovery
//! requests for every subscribed channel, and missed publications are
//! replayed from the server's stream buffer.
//!
//! ```no_run
//! use pylon_client::{Client, ClientConfig, ChannelEvent, StaticTokenProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> pylon_client::Result<()> {
//! let config = ClientConfig::new("ws://localhost:8000/connection/websocket")
//!     .with_access_token("access-token");
//! let client = Client::new(config);
//! client.connect().await?;
//!
//! let subscription = client.create_channel(Arc::new(StaticTokenProvider::new(
//!     "room.42",
//!     "channel-token",
//! )));
//! subscription.observe(|event| {
//!     if let ChannelEvent::Publication { text, .. } = event {
//!         println!("got {text}");
//!     }
//! });
//! subscription.subscribe().await?;
//! # Ok(())
//! # }
//! ```
mod backoff;
mod commands;
mod config;
mod connection;
mod error;
mod reachability;
mod registry;
mod scheduler;
mod subscription;
mod telemetry;
mod token;

pub use backoff::ExponentialBackoff;
pub use commands::{next_command_id, reset_command_ids};
pub use config::ClientConfig;
pub use connection::{Client, ConnectionState};
pub use error::{ClientError, Result};
pub use reachability::{AlwaysReachable, NetworkProbe};
pub use registry::SubscriptionRegistry;
pub use scheduler::{ActionId, Scheduler};
pub use subscription::{ChannelEvent, Subscription, SubscriptionState};
pub use token::{ChannelToken, ChannelTokenProvider, StaticTokenProvider};

pub use pylon_transport::{
    Transport, TransportEvent, TransportFactory, TransportState, WebSocketFactory,
};
pub use pylon_wire::CloseCode;
