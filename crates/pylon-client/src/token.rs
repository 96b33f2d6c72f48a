// Per-channel token retrieval.
use async_trait::async_trait;

/// Channel identity plus the bearer token authorizing a subscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelToken {
    pub channel: String,
    pub token: String,
}

impl ChannelToken {
    pub fn new(channel: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            token: token.into(),
        }
    }
}

/// Host-provided token source, re-queried on every (re)subscribe.
///
/// The channel name returned for a given subscription must never change
/// across calls; the client treats a change as a hard error.
#[async_trait]
pub trait ChannelTokenProvider: Send + Sync {
    async fn get_token(&self) -> anyhow::Result<ChannelToken>;
}

/// Provider returning a fixed channel/token pair.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: ChannelToken,
}

impl StaticTokenProvider {
    pub fn new(channel: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: ChannelToken::new(channel, token),
        }
    }
}

#[async_trait]
impl ChannelTokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> anyhow::Result<ChannelToken> {
        Ok(self.token.clone())
    }
}
