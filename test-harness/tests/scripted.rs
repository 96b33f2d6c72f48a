// Scripted session: the server asserts command order and drives the close.
use pylon_client::{ChannelEvent, Client, ClientConfig, ConnectionState, StaticTokenProvider};
use pylon_harness::{ScriptReply, ScriptStep, ScriptedServer};
use pylon_wire::{ConnectResult, Method, SubscribeResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn scripted_session_runs_expect_reply_push_close() {
    let script = vec![
        ScriptStep::expect(
            Method::Connect,
            ScriptReply::Connect(ConnectResult {
                client: "scripted".to_string(),
                version: "1".to_string(),
                ping: 25,
                pong: false,
                subs: Default::default(),
            }),
        ),
        ScriptStep::expect(
            Method::Subscribe,
            ScriptReply::Subscribe(SubscribeResult {
                epoch: "e9".to_string(),
                offset: 0,
                recoverable: true,
                publications: Vec::new(),
                data: None,
            }),
        ),
        ScriptStep::push("room.scripted", "scripted-hello", 1),
        ScriptStep::close(1000),
    ];
    let server = ScriptedServer::spawn(script).await.expect("spawn");

    let config = ClientConfig::new(server.url()).with_access_token("scripted-access");
    let client = Client::new(config);
    client.connect().await.expect("connect");

    let subscription = client.create_channel(Arc::new(StaticTokenProvider::new(
        "room.scripted",
        "scripted-sub",
    )));
    let (event_tx, mut events) = mpsc::unbounded_channel();
    subscription.observe(move |event| {
        let _ = event_tx.send(event);
    });
    subscription.subscribe().await.expect("subscribe");
    assert_eq!(subscription.epoch(), "e9");

    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event timeout")
            .expect("event feed closed");
        if let ChannelEvent::Publication { text, offset, .. } = event {
            assert_eq!(text, "scripted-hello");
            assert_eq!(offset, 1);
            break;
        }
    }
    assert_eq!(subscription.offset(), 1);

    // The scripted close lands next; wait out the transition, then stop the
    // client so it does not keep retrying the dead listener.
    let mut state = client.watch_state();
    timeout(Duration::from_secs(5), async {
        while *state.borrow_and_update() != ConnectionState::Disconnected {
            state.changed().await.expect("state feed");
        }
    })
    .await
    .expect("disconnect timeout");
    client.disable().await;

    server.finish().await.expect("script completed");
}

#[tokio::test]
async fn scripted_server_rejects_out_of_order_commands() {
    // The script demands a Subscribe first; the client opens with Connect,
    // so the script must fail.
    let script = vec![ScriptStep::expect(
        Method::Subscribe,
        ScriptReply::Subscribe(SubscribeResult::default()),
    )];
    let server = ScriptedServer::spawn(script).await.expect("spawn");

    let config = ClientConfig::new(server.url()).with_access_token("scripted-access");
    let client = Client::new(config);
    let _ = timeout(Duration::from_secs(5), client.connect()).await;
    client.disable().await;

    let err = server.finish().await.expect_err("script should fail");
    assert!(err.to_string().contains("expected subscribe"), "{err}");
}
