//! WebSocket message dispatch
//!
//! Entry point for client messages. Authorization is checked here, then the
//! command runs against the session core; the direct reply (if any) goes back
//! on the calling socket while session-wide effects ride the broadcast.

use crate::protocol::{ClientMessage, GameEvent, GameEventKind};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

/// Macro to check admin authorization and return early if unauthorized
macro_rules! check_admin {
    ($role:expr, $session_id:expr, $action:expr) => {
        if *$role != Role::Admin {
            return Some(GameEvent::now(
                $session_id.clone(),
                GameEventKind::Error {
                    code: "UNAUTHORIZED".to_string(),
                    msg: format!("Only the admin can {}", $action),
                },
            ));
        }
    };
}

/// Handle client messages and return the optional direct reply.
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<GameEvent> {
    match msg {
        ClientMessage::CreateSession { config } => {
            check_admin!(role, String::new(), "create sessions");
            match state.create_session(&config).await {
                Ok((session, participants)) => Some(GameEvent::now(
                    session.id.clone(),
                    GameEventKind::SessionCreated {
                        session,
                        participants,
                    },
                )),
                Err(err) => Some(GameEvent::now(String::new(), GameEventKind::error(&err))),
            }
        }

        ClientMessage::AddParticipant { session_id, name } => {
            check_admin!(role, session_id, "add participants");
            match state.add_participant(&session_id, name).await {
                Ok(participant) => Some(GameEvent::now(
                    session_id,
                    GameEventKind::ParticipantJoined { participant },
                )),
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::StartSession { session_id } => {
            check_admin!(role, session_id, "start the session");
            match state.start_session(&session_id).await {
                Ok(session) => Some(GameEvent::now(
                    session_id,
                    GameEventKind::SessionStarted { session },
                )),
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::OpenRound {
            session_id,
            question_type,
            reciter,
        } => {
            check_admin!(role, session_id, "open rounds");
            match state
                .open_round(&session_id, question_type, reciter.as_deref())
                .await
            {
                // The broadcast already carried RoundOpened; echo it as the
                // direct reply so the admin sees the round even before its
                // subscription catches up.
                Ok(round) => {
                    let timer_seconds = match state.session_state(&session_id).await {
                        Ok((session, _, _)) => session.timer_seconds,
                        Err(_) => 0,
                    };
                    Some(GameEvent::now(
                        session_id,
                        GameEventKind::RoundOpened {
                            round,
                            timer_seconds,
                        },
                    ))
                }
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::PressBuzzer {
            session_id,
            round_id,
            participant_id,
            client_elapsed_seconds,
        } => {
            match state
                .press_buzzer(&session_id, &round_id, &participant_id, client_elapsed_seconds)
                .await
            {
                // The press itself is broadcast; no direct reply needed.
                Ok(_) => None,
                Err(err) => {
                    // Rejections are visible to the whole session so the
                    // admin sees blocked or late presses as they happen.
                    let event = GameEvent::now(session_id.clone(), GameEventKind::error(&err));
                    if let Ok(handle) = state.handle(&session_id).await {
                        handle.emit(event.clone());
                    }
                    Some(event)
                }
            }
        }

        ClientMessage::GiveChance {
            session_id,
            round_id,
        } => {
            check_admin!(role, session_id, "hand out answer turns");
            match state.give_chance(&session_id, &round_id).await {
                // AnswerTurn rides the broadcast.
                Ok(_) => None,
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::RecordAnswer {
            session_id,
            press_id,
            text,
            is_correct,
        } => match state
            .record_answer(&session_id, &press_id, text, is_correct)
            .await
        {
            Ok(_) => None,
            Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
        },

        ClientMessage::ValidateAnswer {
            session_id,
            round_id,
            participant_id,
            is_correct,
            admin_bonus,
        } => {
            check_admin!(role, session_id, "validate answers");
            match state
                .validate_answer(&session_id, &round_id, &participant_id, is_correct, admin_bonus)
                .await
            {
                Ok(_) => None,
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::CloseRound {
            session_id,
            round_id,
        } => {
            check_admin!(role, session_id, "close rounds");
            match state.close_round(&session_id, &round_id).await {
                Ok(_) => None,
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::EndSession { session_id } => {
            check_admin!(role, session_id, "end the session");
            match state.end_session(&session_id).await {
                Ok(_) => None,
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::Heartbeat {
            session_id,
            participant_id,
        } => match state.heartbeat(&session_id, &participant_id).await {
            Ok(()) => None,
            Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
        },

        ClientMessage::AwardBonus {
            session_id,
            participant_id,
            points,
        } => {
            check_admin!(role, session_id, "award bonus points");
            match state.award_bonus(&session_id, &participant_id, points).await {
                Ok(_) => None,
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::SetParticipantBlock {
            session_id,
            participant_id,
            blocked,
        } => {
            check_admin!(role, session_id, "block participants");
            match state
                .set_participant_block(&session_id, &participant_id, blocked)
                .await
            {
                Ok(participant) => Some(GameEvent::now(
                    session_id,
                    GameEventKind::ParticipantBlocked {
                        participant_id: participant.id,
                        participant_name: participant.name,
                    },
                )),
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::GetSession { session_id } => {
            match state.session_state(&session_id).await {
                Ok((session, participants, current_round)) => Some(GameEvent::now(
                    session_id,
                    GameEventKind::SessionState {
                        session,
                        participants,
                        current_round,
                    },
                )),
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }

        ClientMessage::GetScoreboard { session_id } => {
            match state.scoreboard(&session_id).await {
                Ok(scores) => Some(GameEvent::now(
                    session_id,
                    GameEventKind::ScoreboardUpdated { scores },
                )),
                Err(err) => Some(GameEvent::now(session_id, GameEventKind::error(&err))),
            }
        }
    }
}
