// End-to-end flow over a real WebSocket: harness server, default transport.
use pylon_client::{ChannelEvent, Client, ClientConfig, ConnectionState, StaticTokenProvider};
use pylon_harness::{HARNESS_EPOCH, HarnessServer};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

async fn recv_event(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event timeout")
        .expect("event channel closed")
}

#[tokio::test]
async fn connect_subscribe_receive_over_websocket() {
    let server = HarnessServer::spawn().await.expect("spawn harness");
    let config = ClientConfig::new(server.url()).with_access_token("harness-access");
    let client = Client::new(config);
    client.connect().await.expect("connect");
    assert_eq!(client.state(), ConnectionState::Connected);

    let subscription = client.create_channel(Arc::new(StaticTokenProvider::new(
        "room.demo",
        "harness-sub",
    )));
    let (event_tx, mut events) = mpsc::unbounded_channel();
    subscription.observe(move |event| {
        let _ = event_tx.send(event);
    });
    subscription.subscribe().await.expect("subscribe");
    assert_eq!(subscription.epoch(), HARNESS_EPOCH);

    server.push("room.demo", "hello", 1).expect("push");
    loop {
        if let ChannelEvent::Publication { text, data, offset } = recv_event(&mut events).await {
            assert_eq!(text, "hello");
            assert_eq!(data.as_ref(), b"hello");
            assert_eq!(offset, 1);
            break;
        }
    }
    assert_eq!(subscription.offset(), 1);

    client.publish("room.demo", "from-client").await.expect("publish");

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
