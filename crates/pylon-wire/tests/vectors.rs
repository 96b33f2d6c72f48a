use pylon_wire::{
    CloseCode, Command, ConnectRequest, PublicationData, PublishRequest, SubscribeRequest,
    UnsubscribeRequest, decode_frames, encode_command,
};

#[test]
fn vectors_match_command_encoding() {
    // Exact on-wire bytes, field order included. Servers in the wild key on
    // these shapes, so any drift here is a protocol break.
    let vectors: &[(Command, &str)] = &[
        (
            Command::connect(1, ConnectRequest::new("A")),
            r#"{"id":1,"connect":{"token":"A","subs":[]}}"#,
        ),
        (
            Command::subscribe(
                2,
                SubscribeRequest {
                    channel: "room.42".into(),
                    token: "T".into(),
                    recover: false,
                    offset: 0,
                    epoch: String::new(),
                },
            ),
            r#"{"id":2,"subscribe":{"channel":"room.42","token":"T","recover":false,"offset":0}}"#,
        ),
        (
            Command::subscribe(
                3,
                SubscribeRequest {
                    channel: "room.42".into(),
                    token: "T".into(),
                    recover: true,
                    offset: 1,
                    epoch: "e1".into(),
                },
            ),
            r#"{"id":3,"subscribe":{"channel":"room.42","token":"T","recover":true,"offset":1,"epoch":"e1"}}"#,
        ),
        (
            Command::unsubscribe(
                4,
                UnsubscribeRequest {
                    channel: "room.42".into(),
                },
            ),
            r#"{"id":4,"unsubscribe":{"channel":"room.42"}}"#,
        ),
        (
            Command::publish(
                5,
                PublishRequest {
                    channel: "room.42".into(),
                    data: PublicationData {
                        payload: "hi".into(),
                    },
                },
            ),
            r#"{"id":5,"publish":{"channel":"room.42","data":{"payload":"hi"}}}"#,
        ),
    ];
    for (command, expected) in vectors {
        let encoded = encode_command(command).expect("encode");
        assert_eq!(
            std::str::from_utf8(&encoded).expect("utf8"),
            *expected,
            "encoding mismatch for {:?}",
            command.method()
        );
    }
}

#[test]
fn vectors_decode_server_frames() {
    let connect_ack = r#"{"id":1,"connect":{"client":"c-9f2","version":"5.4.1","ping":25,"pong":true}}"#;
    let replies = decode_frames(connect_ack.as_bytes()).expect("decode");
    let connect = replies[0].connect.as_ref().expect("connect");
    assert_eq!(connect.ping, 25);
    assert!(connect.pong);
    assert_eq!(connect.client, "c-9f2");

    let batch = "{\"id\":2,\"subscribe\":{\"epoch\":\"e1\",\"offset\":0,\"recoverable\":true}}\n\
                 {\"push\":{\"channel\":\"room.42\",\"pub\":{\"offset\":1,\"data\":{\"payload\":\"hi\"}}}}";
    let replies = decode_frames(batch.as_bytes()).expect("decode");
    assert_eq!(replies.len(), 2);
    let subscribe = replies[0].subscribe.as_ref().expect("subscribe");
    assert_eq!(subscribe.epoch, "e1");
    assert!(subscribe.recoverable);
    let push = replies[1].push.as_ref().expect("push");
    assert_eq!(push.channel, "room.42");
    assert_eq!(push.publication.as_ref().expect("pub").offset, 1);

    let kick = r#"{"push":{"channel":"room.42","unsub":{}}}"#;
    let replies = decode_frames(kick.as_bytes()).expect("decode");
    assert_eq!(replies[0].push.as_ref().expect("push").push_type(), "unsubscribe");

    let error = r#"{"id":7,"error":{"code":103,"message":"permission denied"}}"#;
    let replies = decode_frames(error.as_bytes()).expect("decode");
    let error = replies[0].error.as_ref().expect("error");
    assert_eq!(error.code, 103);
    assert_eq!(error.message, "permission denied");
}

#[test]
fn vectors_close_code_table() {
    let table: &[(u16, CloseCode, bool)] = &[
        (1000, CloseCode::Normal, true),
        (1003, CloseCode::UnsupportedData, false),
        (1006, CloseCode::Abnormal, true),
        (1010, CloseCode::MandatoryExtension, false),
        (3001, CloseCode::Shutdown, true),
        (3500, CloseCode::InvalidToken, false),
        (3503, CloseCode::ForceNoReconnect, false),
        (4333, CloseCode::TokenVerificationFailed, true),
        (4444, CloseCode::Unknown(4444), true),
    ];
    for (raw, expected, reconnectable) in table {
        let code = CloseCode::from_u16(*raw);
        assert_eq!(code, *expected);
        assert_eq!(code.is_reconnectable(), *reconnectable, "code {raw}");
    }
}
