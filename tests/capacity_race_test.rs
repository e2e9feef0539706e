//! Two clients send `join` to a room one seat away from capacity at the
//! same instant. `tokio::sync::Barrier` forces the two submissions to
//! actually race instead of relying on scheduling luck; exactly one
//! must win the seat and the other must see `Full`.


use std::sync::Arc;

use tokio::sync::Barrier;

use test_helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_of_two_concurrent_joins_wins_the_last_seat() {
    let app = spawn_app(fast_timing(2)).await;
    app.seed_room("room-1", 1, 2, 2);
    app.seed_user(2);
    app.seed_user(3);

    let (mut host_tx, mut host_rx) = app.connect(1).await;
    recv_frame_of_type(&mut host_rx, "connected").await;
    send(&mut host_tx, join_frame("room-1")).await;
    recv_frame_of_type(&mut host_rx, "joinedRoom").await;

    let url2 = app.ws_url(2);
    let url3 = app.ws_url(3);
    let barrier = Arc::new(Barrier::new(2));

    let b2 = barrier.clone();
    let contender2 = tokio::spawn(async move {
        let (mut tx, mut rx) = connect_url(&url2).await;
        recv_frame_of_type(&mut rx, "connected").await;
        b2.wait().await;
        send(&mut tx, join_frame("room-1")).await;
        recv_frame(&mut rx).await
    });

    let b3 = barrier.clone();
    let contender3 = tokio::spawn(async move {
        let (mut tx, mut rx) = connect_url(&url3).await;
        recv_frame_of_type(&mut rx, "connected").await;
        b3.wait().await;
        send(&mut tx, join_frame("room-1")).await;
        recv_frame(&mut rx).await
    });

    let (result2, result3) = tokio::join!(contender2, contender3);
    let frame2 = result2.expect("contender 2's task panicked");
    let frame3 = result3.expect("contender 3's task panicked");

    let outcomes = [&frame2, &frame3];
    let winners = outcomes.iter().filter(|f| f["type"] == "joinedRoom").count();
    let rejections = outcomes
        .iter()
        .filter(|f| f["type"] == "error" && f["payload"]["code"] == 409)
        .count();

    assert_eq!(winners, 1, "exactly one contender should become a participant");
    assert_eq!(rejections, 1, "the other contender should see Full");
}
