// JSON wire format for the pylon realtime protocol.
use bytes::Bytes;

pub use self::close::CloseCode;
pub use self::messages::{
    Command, ConnectRequest, ConnectResult, DisconnectPush, EmbeddedData, Method, Publication,
    PublicationData, PublishRequest, PublishResult, Push, Reply, ReplyError, SubscribeRequest,
    SubscribeResult, Unsub, UnsubscribeRequest, UnsubscribeResult,
};

mod close;
mod messages;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("frame is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("malformed json document: {0}")]
    Json(#[from] serde_json::Error),
}

/// The server heartbeat frame, also echoed back as the client pong.
pub const HEARTBEAT_FRAME: &[u8] = b"{}";

/// Encode a single outbound command as one UTF-8 JSON document.
///
/// ```
/// use pylon_wire::{Command, ConnectRequest, encode_command};
///
/// let command = Command::connect(1, ConnectRequest::new("token-a"));
/// let bytes = encode_command(&command).expect("encode");
/// assert!(bytes.starts_with(b"{\"id\":1"));
/// ```
pub fn encode_command(command: &Command) -> Result<Bytes> {
    let json = serde_json::to_vec(command)?;
    Ok(Bytes::from(json))
}

/// Decode an inbound frame into zero or more replies.
///
/// The server batches messages by joining JSON documents with `\n`. Every
/// document must parse; a single malformed document fails the whole frame so
/// the caller can log and close rather than silently drop messages.
pub fn decode_frames(raw: &[u8]) -> Result<Vec<Reply>> {
    let text = std::str::from_utf8(raw)?;
    let mut replies = Vec::new();
    for document in text.split('\n') {
        let document = document.trim();
        if document.is_empty() {
            continue;
        }
        replies.push(serde_json::from_str(document)?);
    }
    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        // Encoding then decoding should preserve the command structure.
        let command = Command::subscribe(
            7,
            SubscribeRequest {
                channel: "room.42".into(),
                token: "t".into(),
                recover: false,
                offset: 0,
                epoch: String::new(),
            },
        );
        let encoded = encode_command(&command).expect("encode");
        let back: Command = serde_json::from_slice(&encoded).expect("decode");
        assert_eq!(back, command);
    }

    #[test]
    fn batched_frame_splits_on_newline() {
        let frame = b"{\"id\":1}\n{\"id\":2}\n{\"push\":{\"channel\":\"c\"}}";
        let replies = decode_frames(frame).expect("decode");
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0].id, 1);
        assert_eq!(replies[1].id, 2);
        assert_eq!(replies[2].push.as_ref().expect("push").channel, "c");
    }

    #[test]
    fn heartbeat_is_a_ping() {
        let replies = decode_frames(HEARTBEAT_FRAME).expect("decode");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].is_ping());
    }

    #[test]
    fn push_reply_is_not_a_ping() {
        let replies =
            decode_frames(b"{\"push\":{\"channel\":\"c\",\"pub\":{\"offset\":3,\"data\":{\"payload\":\"x\"}}}}")
                .expect("decode");
        assert!(!replies[0].is_ping());
    }

    #[test]
    fn malformed_document_fails_the_whole_frame() {
        let frame = b"{\"id\":1}\nnot json\n{\"id\":2}";
        assert!(matches!(decode_frames(frame), Err(Error::Json(_))));
    }

    #[test]
    fn empty_frame_decodes_to_nothing() {
        assert!(decode_frames(b"").expect("decode").is_empty());
        assert!(decode_frames(b"\n\n").expect("decode").is_empty());
    }

    #[test]
    fn non_utf8_frame_is_rejected() {
        assert!(matches!(decode_frames(&[0xff, 0xfe]), Err(Error::Utf8(_))));
    }
}
