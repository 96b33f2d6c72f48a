// Network reachability probing that gates reconnection attempts.
use async_trait::async_trait;

/// Host-provided link probe. Polled while reconnection is suspended; never
/// called on a connection that is already up.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Default probe for platforms without a reachability signal: reconnection
/// is never gated and backoff alone paces the attempts.
#[derive(Debug, Default, Clone)]
pub struct AlwaysReachable;

#[async_trait]
impl NetworkProbe for AlwaysReachable {
    async fn is_reachable(&self) -> bool {
        true
    }
}
