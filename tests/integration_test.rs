use hifdh_quest::protocol::{
    ClientMessage, CreateSessionRequest, GameEventKind, SessionEndReason,
};
use hifdh_quest::scoring::ScoringConfig;
use hifdh_quest::state::{AppState, GameRules};
use hifdh_quest::types::{Difficulty, GameMode, QuestionType, Role, SessionStatus};
use hifdh_quest::verses::CanonicalCatalog;
use hifdh_quest::ws::handlers::handle_message;
use std::sync::Arc;

fn app_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(CanonicalCatalog::new()),
        ScoringConfig::low_scale(),
        GameRules::default(),
    ))
}

/// End-to-end integration test for a complete game flow
#[tokio::test]
async fn test_full_game_flow() {
    let state = app_state();
    let admin_role = Role::Admin;
    let player_role = Role::Player;

    // 1. Admin creates a session over surahs 112-114
    let create_result = handle_message(
        ClientMessage::CreateSession {
            config: CreateSessionRequest {
                surah_range_start: Some(112),
                surah_range_end: Some(114),
                juz_number: None,
                difficulty: Difficulty::Medium,
                game_mode: GameMode::Individual,
                question_types: Some(vec![QuestionType::GuessSurah]),
                scoreboard_limit: None,
                participant_names: vec!["Aisha".to_string(), "Bilal".to_string()],
            },
        },
        &admin_role,
        &state,
    )
    .await;

    let (session_id, participants) = match create_result {
        Some(event) => match event.kind {
            GameEventKind::SessionCreated {
                session,
                participants,
            } => {
                assert_eq!(session.status, SessionStatus::Setup);
                assert_eq!(session.timer_seconds, 60);
                assert_eq!(participants.len(), 2, "Should seed 2 participants");
                (session.id, participants)
            }
            other => panic!("Expected SessionCreated, got {:?}", other),
        },
        None => panic!("Expected a direct reply"),
    };
    let aisha = participants[0].id.clone();
    let bilal = participants[1].id.clone();

    // 2. Players cannot run admin commands
    let denied = handle_message(
        ClientMessage::StartSession {
            session_id: session_id.clone(),
        },
        &player_role,
        &state,
    )
    .await;
    match denied {
        Some(event) => match event.kind {
            GameEventKind::Error { code, .. } => assert_eq!(code, "UNAUTHORIZED"),
            other => panic!("Expected Error, got {:?}", other),
        },
        None => panic!("Expected an error reply"),
    }

    // 3. Start the session and open a round
    let started = handle_message(
        ClientMessage::StartSession {
            session_id: session_id.clone(),
        },
        &admin_role,
        &state,
    )
    .await;
    assert!(matches!(
        started.map(|e| e.kind),
        Some(GameEventKind::SessionStarted { .. })
    ));

    let open_result = handle_message(
        ClientMessage::OpenRound {
            session_id: session_id.clone(),
            question_type: None,
            reciter: None,
        },
        &admin_role,
        &state,
    )
    .await;
    let round = match open_result {
        Some(event) => match event.kind {
            GameEventKind::RoundOpened {
                round,
                timer_seconds,
            } => {
                assert_eq!(round.number, 1);
                assert_eq!(timer_seconds, 60);
                assert!((112..=114).contains(&round.verse.locator.surah));
                assert!(round.audio_url.ends_with(".mp3"));
                round
            }
            other => panic!("Expected RoundOpened, got {:?}", other),
        },
        None => panic!("Expected a direct reply"),
    };

    // 4. Both players buzz; presses are broadcast, not replied to directly
    let mut events = state.subscribe(&session_id).await.unwrap();

    let press = handle_message(
        ClientMessage::PressBuzzer {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
            participant_id: aisha.clone(),
            client_elapsed_seconds: 2.0,
        },
        &player_role,
        &state,
    )
    .await;
    assert!(press.is_none(), "Successful presses ride the broadcast");

    let press_event = events.recv().await.unwrap();
    let press_id = match press_event.kind {
        GameEventKind::BuzzerPressed {
            press_id,
            buzz_rank,
            remaining_slots,
            ..
        } => {
            assert_eq!(buzz_rank, 1);
            assert_eq!(remaining_slots, 2);
            press_id
        }
        other => panic!("Expected BuzzerPressed, got {:?}", other),
    };

    handle_message(
        ClientMessage::PressBuzzer {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
            participant_id: bilal.clone(),
            client_elapsed_seconds: 4.5,
        },
        &player_role,
        &state,
    )
    .await;

    // 5. A second press from the same player is rejected and the rejection
    //    is visible on the session stream
    let dup = handle_message(
        ClientMessage::PressBuzzer {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
            participant_id: aisha.clone(),
            client_elapsed_seconds: 2.5,
        },
        &player_role,
        &state,
    )
    .await;
    match dup {
        Some(event) => match event.kind {
            GameEventKind::Error { code, .. } => assert_eq!(code, "ALREADY_PRESSED"),
            other => panic!("Expected Error, got {:?}", other),
        },
        None => panic!("Expected an error reply"),
    }

    // 6. The admin hands out the answer turn; Aisha holds rank 1
    let mut turn_events = state.subscribe(&session_id).await.unwrap();
    let turn_reply = handle_message(
        ClientMessage::GiveChance {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
        },
        &admin_role,
        &state,
    )
    .await;
    assert!(turn_reply.is_none(), "Answer turns ride the broadcast");
    match turn_events.recv().await.unwrap().kind {
        GameEventKind::AnswerTurn {
            participant_id,
            buzz_rank,
            ..
        } => {
            assert_eq!(participant_id, aisha);
            assert_eq!(buzz_rank, 1);
        }
        other => panic!("Expected AnswerTurn, got {:?}", other),
    }

    // 7. Aisha submits and the admin validates: base 10, fast (<=5s) 1.5x,
    //    rank 1 +25 -> 40 points
    handle_message(
        ClientMessage::RecordAnswer {
            session_id: session_id.clone(),
            press_id: press_id.clone(),
            text: "Al-Ikhlas".to_string(),
            is_correct: None,
        },
        &player_role,
        &state,
    )
    .await;

    handle_message(
        ClientMessage::ValidateAnswer {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
            participant_id: aisha.clone(),
            is_correct: true,
            admin_bonus: None,
        },
        &admin_role,
        &state,
    )
    .await;

    let scoreboard = handle_message(
        ClientMessage::GetScoreboard {
            session_id: session_id.clone(),
        },
        &player_role,
        &state,
    )
    .await;
    match scoreboard {
        Some(event) => match event.kind {
            GameEventKind::ScoreboardUpdated { scores } => {
                assert_eq!(scores[0].name, "Aisha");
                assert_eq!(scores[0].total_score, 40);
                assert_eq!(scores[0].rank, 1);
                assert_eq!(scores[1].total_score, 0);
            }
            other => panic!("Expected ScoreboardUpdated, got {:?}", other),
        },
        None => panic!("Expected a direct reply"),
    }

    // 8. The admin grants Bilal a flat consolation bonus
    handle_message(
        ClientMessage::AwardBonus {
            session_id: session_id.clone(),
            participant_id: bilal.clone(),
            points: 5,
        },
        &admin_role,
        &state,
    )
    .await;
    let scoreboard = handle_message(
        ClientMessage::GetScoreboard {
            session_id: session_id.clone(),
        },
        &player_role,
        &state,
    )
    .await;
    match scoreboard.map(|e| e.kind) {
        Some(GameEventKind::ScoreboardUpdated { scores }) => {
            assert_eq!(scores[1].name, "Bilal");
            assert_eq!(scores[1].total_score, 5);
        }
        other => panic!("Expected ScoreboardUpdated, got {:?}", other),
    }

    // 9. Close the round and end the session
    handle_message(
        ClientMessage::CloseRound {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
        },
        &admin_role,
        &state,
    )
    .await;

    let mut events = state.subscribe(&session_id).await.unwrap();
    handle_message(
        ClientMessage::EndSession {
            session_id: session_id.clone(),
        },
        &admin_role,
        &state,
    )
    .await;

    let end_event = events.recv().await.unwrap();
    match end_event.kind {
        GameEventKind::SessionEnded {
            reason,
            total_rounds,
            winner,
            ..
        } => {
            assert_eq!(reason, SessionEndReason::AdminEnded);
            assert_eq!(total_rounds, 1);
            assert_eq!(winner.unwrap().name, "Aisha");
        }
        other => panic!("Expected SessionEnded, got {:?}", other),
    }

    // 10. The completed session still answers state queries
    let snapshot = handle_message(
        ClientMessage::GetSession {
            session_id: session_id.clone(),
        },
        &player_role,
        &state,
    )
    .await;
    match snapshot {
        Some(event) => match event.kind {
            GameEventKind::SessionState { session, .. } => {
                assert_eq!(session.status, SessionStatus::Completed);
            }
            other => panic!("Expected SessionState, got {:?}", other),
        },
        None => panic!("Expected a direct reply"),
    }
}

/// The anti-domination block surfaces through the message layer too.
#[tokio::test]
async fn test_consecutive_first_buzz_block_via_messages() {
    let state = app_state();
    let admin_role = Role::Admin;
    let player_role = Role::Player;

    let created = handle_message(
        ClientMessage::CreateSession {
            config: CreateSessionRequest {
                surah_range_start: Some(1),
                surah_range_end: Some(114),
                juz_number: None,
                difficulty: Difficulty::Easy,
                game_mode: GameMode::Team,
                question_types: None,
                scoreboard_limit: None,
                participant_names: vec!["Falcons".to_string(), "Doves".to_string()],
            },
        },
        &admin_role,
        &state,
    )
    .await;
    let (session_id, falcons) = match created.map(|e| e.kind) {
        Some(GameEventKind::SessionCreated {
            session,
            participants,
        }) => {
            assert!(participants.iter().all(|p| p.is_team));
            (session.id, participants[0].id.clone())
        }
        other => panic!("Expected SessionCreated, got {:?}", other),
    };

    handle_message(
        ClientMessage::StartSession {
            session_id: session_id.clone(),
        },
        &admin_role,
        &state,
    )
    .await;

    // Three rounds of first buzzes trips the block
    let mut last_round_id = String::new();
    for _ in 0..3 {
        let opened = handle_message(
            ClientMessage::OpenRound {
                session_id: session_id.clone(),
                question_type: Some(QuestionType::GuessMeaning),
                reciter: None,
            },
            &admin_role,
            &state,
        )
        .await;
        let round = match opened.map(|e| e.kind) {
            Some(GameEventKind::RoundOpened { round, .. }) => round,
            other => panic!("Expected RoundOpened, got {:?}", other),
        };
        handle_message(
            ClientMessage::PressBuzzer {
                session_id: session_id.clone(),
                round_id: round.id.clone(),
                participant_id: falcons.clone(),
                client_elapsed_seconds: 1.0,
            },
            &player_role,
            &state,
        )
        .await;
        handle_message(
            ClientMessage::CloseRound {
                session_id: session_id.clone(),
                round_id: round.id.clone(),
            },
            &admin_role,
            &state,
        )
        .await;
        last_round_id = round.id;
    }
    assert!(!last_round_id.is_empty());

    // Blocked round
    let opened = handle_message(
        ClientMessage::OpenRound {
            session_id: session_id.clone(),
            question_type: None,
            reciter: None,
        },
        &admin_role,
        &state,
    )
    .await;
    let round = match opened.map(|e| e.kind) {
        Some(GameEventKind::RoundOpened { round, .. }) => round,
        other => panic!("Expected RoundOpened, got {:?}", other),
    };

    let rejected = handle_message(
        ClientMessage::PressBuzzer {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
            participant_id: falcons.clone(),
            client_elapsed_seconds: 1.0,
        },
        &player_role,
        &state,
    )
    .await;
    match rejected.map(|e| e.kind) {
        Some(GameEventKind::Error { code, .. }) => assert_eq!(code, "BLOCKED"),
        other => panic!("Expected Error, got {:?}", other),
    }

    // Admin can lift the block immediately
    handle_message(
        ClientMessage::SetParticipantBlock {
            session_id: session_id.clone(),
            participant_id: falcons.clone(),
            blocked: false,
        },
        &admin_role,
        &state,
    )
    .await;

    let press = handle_message(
        ClientMessage::PressBuzzer {
            session_id: session_id.clone(),
            round_id: round.id.clone(),
            participant_id: falcons.clone(),
            client_elapsed_seconds: 2.0,
        },
        &player_role,
        &state,
    )
    .await;
    assert!(press.is_none(), "Unblocked team buzzes successfully");
}
