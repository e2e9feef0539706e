//! Three players join a room, the host starts the quiz, two submit the
//! correct answer and exactly one is credited as the winner; the
//! loser's late submission is silently ignored rather than erroring.


use test_helpers::*;

#[tokio::test]
async fn first_correct_answer_wins_and_the_runner_up_is_silently_ignored() {
    let app = spawn_app(fast_timing(1)).await;
    app.seed_room("room-1", 1, 8, 1);
    app.seed_user(2);
    app.seed_user(3);

    let (mut host_tx, mut host_rx) = app.connect(1).await;
    let (mut u2_tx, mut u2_rx) = app.connect(2).await;
    let (mut u3_tx, mut u3_rx) = app.connect(3).await;

    recv_frame_of_type(&mut host_rx, "connected").await;
    recv_frame_of_type(&mut u2_rx, "connected").await;
    recv_frame_of_type(&mut u3_rx, "connected").await;

    send(&mut host_tx, join_frame("room-1")).await;
    recv_frame_of_type(&mut host_rx, "joinedRoom").await;

    send(&mut u2_tx, join_frame("room-1")).await;
    recv_frame_of_type(&mut u2_rx, "joinedRoom").await;
    recv_frame_of_type(&mut host_rx, "participantJoined").await;

    send(&mut u3_tx, join_frame("room-1")).await;
    recv_frame_of_type(&mut u3_rx, "joinedRoom").await;
    recv_frame_of_type(&mut host_rx, "participantJoined").await;

    send(&mut host_tx, start_quiz_frame("room-1")).await;
    recv_frame_of_type(&mut host_rx, "quizStarting").await;
    recv_frame_of_type(&mut u2_rx, "quizStarting").await;
    recv_frame_of_type(&mut u3_rx, "quizStarting").await;

    recv_frame_of_type(&mut host_rx, "nextQuestion").await;
    recv_frame_of_type(&mut u2_rx, "nextQuestion").await;
    recv_frame_of_type(&mut u3_rx, "nextQuestion").await;

    // U2's submission is processed by the room actor first (the test
    // drives it to completion before U3 ever sends), matching the
    // scenario's "U2's message is serialized first".
    send(&mut u2_tx, submit_answer_frame("room-1", 0, 0)).await;
    let end = recv_frame_of_type(&mut u2_rx, "endQuestion").await;
    assert_eq!(end["payload"]["questionIndex"], 0);
    assert_eq!(end["payload"]["correctIdx"], 0);
    assert_eq!(end["payload"]["winnerUserId"], 2);
    recv_frame_of_type(&mut host_rx, "endQuestion").await;
    recv_frame_of_type(&mut u3_rx, "endQuestion").await;

    // The question already resolved; U3's submission lands in `Reveal`
    // and must be a silent no-op, not an `error` frame.
    send(&mut u3_tx, submit_answer_frame("room-1", 0, 0)).await;
    let u3_next = recv_frame(&mut u3_rx).await;
    assert_eq!(u3_next["type"], "quizFinished");

    let finished = recv_frame_of_type(&mut u2_rx, "quizFinished").await;
    let standings = finished["payload"]["standings"].as_array().unwrap();
    assert_eq!(standings.len(), 3);

    let winner = standings
        .iter()
        .find(|s| s["userId"] == 2)
        .expect("U2 appears in standings");
    assert_eq!(winner["score"], 1);
    assert_eq!(winner["newRating"], 1210);

    let runner_up = standings
        .iter()
        .find(|s| s["userId"] == 3)
        .expect("U3 appears in standings");
    assert_eq!(runner_up["score"], 0);

    let host_standing = standings
        .iter()
        .find(|s| s["userId"] == 1)
        .expect("host appears in standings");
    assert_eq!(host_standing["score"], 0);
}
