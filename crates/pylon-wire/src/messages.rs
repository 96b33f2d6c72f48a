// Command, reply, and push message shapes.
//
// Every field of an inbound reply is optional; receivers distinguish the
// message kind by which sub-object is present. Outbound commands serialize
// only the sub-object matching their method.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Command methods, used for dispatch and metric tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Connect,
    Subscribe,
    Unsubscribe,
    Publish,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Connect => "connect",
            Method::Subscribe => "subscribe",
            Method::Unsubscribe => "unsubscribe",
            Method::Publish => "publish",
        }
    }
}

/// Outbound client command. Ids start at 1; 0 is reserved for server pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Command {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<ConnectRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<SubscribeRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe: Option<UnsubscribeRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishRequest>,
}

impl Command {
    pub fn connect(id: u32, request: ConnectRequest) -> Self {
        Self {
            id,
            connect: Some(request),
            ..Default::default()
        }
    }

    pub fn subscribe(id: u32, request: SubscribeRequest) -> Self {
        Self {
            id,
            subscribe: Some(request),
            ..Default::default()
        }
    }

    pub fn unsubscribe(id: u32, request: UnsubscribeRequest) -> Self {
        Self {
            id,
            unsubscribe: Some(request),
            ..Default::default()
        }
    }

    pub fn publish(id: u32, request: PublishRequest) -> Self {
        Self {
            id,
            publish: Some(request),
            ..Default::default()
        }
    }

    pub fn method(&self) -> Method {
        if self.connect.is_some() {
            Method::Connect
        } else if self.subscribe.is_some() {
            Method::Subscribe
        } else if self.unsubscribe.is_some() {
            Method::Unsubscribe
        } else {
            Method::Publish
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConnectRequest {
    pub token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub subs: Vec<SubscribeRequest>,
}

impl ConnectRequest {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubscribeRequest {
    pub channel: String,
    pub token: String,
    pub recover: bool,
    pub offset: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub epoch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UnsubscribeRequest {
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PublishRequest {
    pub channel: String,
    pub data: PublicationData,
}

/// Inbound message: a reply to a command (`id > 0`), a server push
/// (`id == 0`, `push` present), or the heartbeat `{}` (neither).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Reply {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<ConnectResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<SubscribeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe: Option<UnsubscribeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<Push>,
}

impl Reply {
    /// A frame with no id and no push body is the server heartbeat.
    pub fn is_ping(&self) -> bool {
        self.id == 0 && self.push.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReplyError {
    pub code: u32,
    pub message: String,
}

/// Server push, typed by which sub-object is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Push {
    pub channel: String,
    #[serde(rename = "pub", skip_serializing_if = "Option::is_none")]
    pub publication: Option<Publication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsub: Option<Unsub>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disconnect: Option<DisconnectPush>,
}

impl Push {
    /// Stable label for the `push_received` metric tag.
    pub fn push_type(&self) -> &'static str {
        if self.publication.is_some() {
            "publication"
        } else if self.unsub.is_some() {
            "unsubscribe"
        } else if self.disconnect.is_some() {
            "disconnect"
        } else {
            "unknown"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Publication {
    pub offset: u64,
    pub data: PublicationData,
}

/// Opaque UTF-8 payload; subscribers may also read it as raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PublicationData {
    pub payload: String,
}

/// Server kick notification for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Unsub {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DisconnectPush {
    pub code: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConnectResult {
    pub client: String,
    pub version: String,
    /// Server-advertised ping interval, seconds.
    pub ping: u32,
    /// Whether the client must echo the heartbeat frame.
    pub pong: bool,
    /// Recovery block: per-channel subscription results echoed back on
    /// reconnect handshakes.
    pub subs: HashMap<String, SubscribeResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubscribeResult {
    pub epoch: String,
    pub offset: u64,
    pub recoverable: bool,
    pub publications: Vec<Publication>,
    /// Embedded single-publication form (`result.data.data.payload`), only
    /// consulted when `publications` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EmbeddedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmbeddedData {
    pub data: PublicationData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UnsubscribeResult {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PublishResult {}
