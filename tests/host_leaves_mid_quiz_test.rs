//! The host's connection drops mid-quiz. The quiz continues for the
//! remaining participant, and final standings still credit the host
//! with the score accumulated before they dropped.


use futures_util::SinkExt;
use test_helpers::*;

#[tokio::test]
async fn departed_host_keeps_their_score_in_final_standings() {
    let app = spawn_app(fast_timing(2)).await;
    app.seed_room("room-1", 1, 8, 2);
    app.seed_user(2);

    let (mut host_tx, mut host_rx) = app.connect(1).await;
    let (mut u2_tx, mut u2_rx) = app.connect(2).await;
    recv_frame_of_type(&mut host_rx, "connected").await;
    recv_frame_of_type(&mut u2_rx, "connected").await;

    send(&mut host_tx, join_frame("room-1")).await;
    recv_frame_of_type(&mut host_rx, "joinedRoom").await;
    send(&mut u2_tx, join_frame("room-1")).await;
    recv_frame_of_type(&mut u2_rx, "joinedRoom").await;
    recv_frame_of_type(&mut host_rx, "participantJoined").await;

    send(&mut host_tx, start_quiz_frame("room-1")).await;
    recv_frame_of_type(&mut host_rx, "quizStarting").await;
    recv_frame_of_type(&mut u2_rx, "quizStarting").await;
    recv_frame_of_type(&mut host_rx, "nextQuestion").await;
    recv_frame_of_type(&mut u2_rx, "nextQuestion").await;

    // U2 wins question 0 before the host ever drops.
    send(&mut u2_tx, submit_answer_frame("room-1", 0, 0)).await;
    let end0 = recv_frame_of_type(&mut u2_rx, "endQuestion").await;
    assert_eq!(end0["payload"]["winnerUserId"], 2);
    recv_frame_of_type(&mut host_rx, "endQuestion").await;

    // The host's connection drops between question 0 and question 1.
    host_tx.close().await.ok();
    drop(host_tx);
    drop(host_rx);
    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    // The quiz continues with U2 alone.
    recv_frame_of_type(&mut u2_rx, "nextQuestion").await;
    send(&mut u2_tx, submit_answer_frame("room-1", 1, 0)).await;
    let end1 = recv_frame_of_type(&mut u2_rx, "endQuestion").await;
    assert_eq!(end1["payload"]["winnerUserId"], 2);

    let finished = recv_frame_of_type(&mut u2_rx, "quizFinished").await;
    let standings = finished["payload"]["standings"].as_array().unwrap();
    assert_eq!(standings.len(), 2, "the departed host must still appear");

    let host_standing = standings
        .iter()
        .find(|s| s["userId"] == 1)
        .expect("host's pre-departure score survives to final standings");
    assert_eq!(host_standing["score"], 0);
    assert_eq!(host_standing["newRating"], 1200);

    let u2_standing = standings.iter().find(|s| s["userId"] == 2).unwrap();
    assert_eq!(u2_standing["score"], 2);
    assert_eq!(u2_standing["newRating"], 1220);
}
