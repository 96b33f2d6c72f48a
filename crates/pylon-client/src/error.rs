// Public error surface of the client.
use pylon_wire::CloseCode;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors observable at the public boundary.
///
/// Variants carry owned strings rather than source errors so a single
/// failure can fan out to every waiter that shares it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("access token is empty")]
    EmptyToken,
    #[error("token provider returned an empty channel")]
    EmptyChannel,
    #[error("token provider changed channel from {previous} to {current}")]
    ChannelChanged { previous: String, current: String },
    #[error("channel {0} is already subscribed")]
    AlreadySubscribed(String),
    #[error("channel {0} is not subscribed")]
    AlreadyUnsubscribed(String),
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },
    #[error("command interrupted by close: {close_code}")]
    CommandInterrupted { close_code: CloseCode },
    #[error("no reply within the command timeout")]
    CommandTimeout,
    #[error("duplicate command id {0}")]
    DuplicateCommandId(u32),
    #[error("token provider failed: {0}")]
    TokenRetrieverFailed(String),
    #[error("subscription is disposed")]
    Disposed,
    #[error("codec error: {0}")]
    Codec(String),
    #[error("server error {code}: {message}")]
    Server { code: u32, message: String },
}

impl From<pylon_wire::Error> for ClientError {
    fn from(err: pylon_wire::Error) -> Self {
        ClientError::Codec(err.to_string())
    }
}
