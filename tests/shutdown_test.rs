//! Graceful-shutdown close-frame behavior: §4.7/§6 require every live
//! connection to receive a `GoingAway` close frame, not just have its
//! socket dropped.


use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;

use test_helpers::{fast_timing, spawn_app};

#[tokio::test]
async fn shutdown_all_sends_a_going_away_close_frame() {
    let app = spawn_app(fast_timing(1)).await;
    let (mut _sink, mut source) = app.connect(1).await;

    // Drain the `connected` frame before triggering shutdown.
    let _ = test_helpers::recv_frame(&mut source).await;

    app.gateway.connections.shutdown_all();

    let message = tokio::time::timeout(Duration::from_secs(2), source.next())
        .await
        .expect("timed out waiting for the close frame")
        .expect("connection dropped without a close frame")
        .expect("websocket transport error");

    match message {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Away),
        other => panic!("expected a close frame, got {other:?}"),
    }
}
