use super::{AppState, GameState};
use crate::error::{GameError, GameResult};
use crate::protocol::{CreateSessionRequest, GameEvent, GameEventKind, SessionEndReason};
use crate::scoring;
use crate::types::*;

impl AppState {
    /// Create a session in `setup` with its initial participants.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> GameResult<(Session, Vec<Participant>)> {
        let selection = request.selection()?;

        let question_types = match &request.question_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => QuestionType::ALL.to_vec(),
        };

        let session = Session {
            id: ulid::Ulid::new().to_string(),
            status: SessionStatus::Setup,
            selection,
            difficulty: request.difficulty,
            timer_seconds: request.difficulty.timer_seconds(),
            game_mode: request.game_mode,
            question_types,
            scoreboard_limit: request
                .scoreboard_limit
                .unwrap_or(self.rules.default_scoreboard_limit),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut game = GameState {
            session: session.clone(),
            participants: Default::default(),
            rounds: Default::default(),
            round_order: Vec::new(),
            presses: Default::default(),
        };

        let participants: Vec<Participant> = request
            .participant_names
            .iter()
            .map(|name| new_participant(&session, name.clone()))
            .collect();
        for participant in &participants {
            game.participants
                .insert(participant.id.clone(), participant.clone());
        }

        tracing::info!(
            "Created session {} ({:?}, {:?}, {} participants)",
            session.id,
            session.difficulty,
            session.game_mode,
            participants.len()
        );

        let handle = self.insert_session(game).await;
        handle.emit(GameEvent::now(
            session.id.clone(),
            GameEventKind::SessionCreated {
                session: session.clone(),
                participants: participants.clone(),
            },
        ));

        Ok((session, participants))
    }

    /// Mid-setup join. Once the session is active the roster is fixed.
    pub async fn add_participant(
        &self,
        session_id: &str,
        name: String,
    ) -> GameResult<Participant> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        if game.session.status != SessionStatus::Setup {
            return Err(GameError::InvalidState(
                "participants can only join during setup".into(),
            ));
        }

        let participant = new_participant(&game.session, name);
        game.participants
            .insert(participant.id.clone(), participant.clone());

        tracing::info!("Participant {} joined session {}", participant.name, session_id);
        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::ParticipantJoined {
                participant: participant.clone(),
            },
        ));

        Ok(participant)
    }

    pub async fn start_session(&self, session_id: &str) -> GameResult<Session> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        if game.session.status != SessionStatus::Setup {
            return Err(GameError::InvalidState(
                "session can only be started from setup".into(),
            ));
        }

        game.session.status = SessionStatus::Active;
        let session = game.session.clone();
        tracing::info!("Started session {}", session_id);

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::SessionStarted {
                session: session.clone(),
            },
        ));

        Ok(session)
    }

    /// End an active session and broadcast the final ranking.
    pub async fn end_session(&self, session_id: &str) -> GameResult<Session> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        if game.session.status != SessionStatus::Active {
            return Err(GameError::InvalidState(
                "only an active session can be ended".into(),
            ));
        }

        game.session.status = SessionStatus::Completed;
        let final_scores = game.scoreboard();
        let winner = final_scores.first().cloned();
        let session = game.session.clone();

        tracing::info!(
            "Ended session {} after {} rounds",
            session_id,
            game.round_order.len()
        );

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::SessionEnded {
                reason: SessionEndReason::AdminEnded,
                total_rounds: game.round_order.len() as u32,
                final_scores,
                winner,
            },
        ));

        Ok(session)
    }

    /// Score an answer and apply it to the participant. The buzz press, if
    /// one exists, supplies latency and rank; an admin may validate a
    /// participant who never buzzed, forfeiting those bonuses.
    pub async fn validate_answer(
        &self,
        session_id: &str,
        round_id: &str,
        participant_id: &str,
        is_correct: bool,
        admin_bonus: Option<u32>,
    ) -> GameResult<scoring::ScoreBreakdown> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        let round = game
            .rounds
            .get(round_id)
            .ok_or_else(|| GameError::NotFound("Round", round_id.to_string()))?;
        let question_type = round.question_type;

        let (latency, rank, press_id) = match game.press_for(round_id, participant_id) {
            Some(press) => (
                Some(press.latency_seconds),
                Some(press.buzz_rank),
                Some(press.id.clone()),
            ),
            None => (None, None, None),
        };

        let participant = game
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| GameError::NotFound("Participant", participant_id.to_string()))?;

        let breakdown = scoring::score(
            &self.scoring,
            question_type,
            latency,
            rank,
            participant.consecutive_correct_answers,
            is_correct,
            admin_bonus.unwrap_or(0),
        );

        if is_correct {
            participant.consecutive_correct_answers += 1;
            participant.total_score += breakdown.total;
            tracing::info!(
                "Awarded {} points to {} (streak {}, total {})",
                breakdown.total,
                participant.name,
                participant.consecutive_correct_answers,
                participant.total_score
            );
        } else {
            participant.consecutive_correct_answers = 0;
            tracing::info!("Wrong answer from {}, streak reset", participant.name);
        }

        let participant_name = participant.name.clone();
        let total_score = participant.total_score;

        if let Some(id) = press_id {
            if let Some(press) = game.presses.get_mut(&id) {
                press.is_correct = Some(is_correct);
                press.points_awarded = breakdown.total;
            }
        }

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::AnswerValidated {
                round_id: round_id.to_string(),
                participant_id: participant_id.to_string(),
                participant_name,
                is_correct,
                breakdown: breakdown.clone(),
                total_score,
            },
        ));
        emit_scoreboard(&handle, &game);

        Ok(breakdown)
    }

    /// Admin grants flat points outside answer validation. Does not touch
    /// the correctness streak.
    pub async fn award_bonus(
        &self,
        session_id: &str,
        participant_id: &str,
        points: u32,
    ) -> GameResult<Participant> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        let participant = game
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| GameError::NotFound("Participant", participant_id.to_string()))?;

        participant.total_score += points;
        let updated = participant.clone();

        tracing::info!(
            "Admin awarded {} bonus points to {} (total {})",
            points,
            updated.name,
            updated.total_score
        );

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::BonusAwarded {
                participant_id: updated.id.clone(),
                participant_name: updated.name.clone(),
                points,
                total_score: updated.total_score,
            },
        ));
        emit_scoreboard(&handle, &game);

        Ok(updated)
    }

    /// Refresh a participant's heartbeat, reconnecting them if needed.
    pub async fn heartbeat(&self, session_id: &str, participant_id: &str) -> GameResult<()> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        let participant = game
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| GameError::NotFound("Participant", participant_id.to_string()))?;

        participant.last_heartbeat = Some(chrono::Utc::now().to_rfc3339());
        if !participant.is_connected {
            participant.is_connected = true;
            tracing::info!("Participant {} reconnected", participant.name);
            emit_scoreboard(&handle, &game);
        }

        Ok(())
    }

    /// Flip a participant to disconnected when their socket drops. Missed
    /// events are not replayed; clients reconcile via `GetSession`.
    pub async fn mark_disconnected(&self, session_id: &str, participant_id: &str) {
        let Ok(handle) = self.handle(session_id).await else {
            return;
        };
        let mut game = handle.game.lock().await;
        if let Some(participant) = game.participants.get_mut(participant_id) {
            participant.is_connected = false;
            tracing::info!("Participant {} disconnected", participant.name);
        }
    }

    /// Admin override for the automatic one-round block.
    pub async fn set_participant_block(
        &self,
        session_id: &str,
        participant_id: &str,
        blocked: bool,
    ) -> GameResult<Participant> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        let participant = game
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| GameError::NotFound("Participant", participant_id.to_string()))?;

        participant.blocked_for_next_round = blocked;
        participant.block_served = false;
        if !blocked {
            participant.consecutive_first_buzzes = 0;
        }
        let updated = participant.clone();

        tracing::info!(
            "Admin {} participant {}",
            if blocked { "blocked" } else { "unblocked" },
            updated.name
        );
        emit_scoreboard(&handle, &game);

        Ok(updated)
    }

    /// Full ranked scoreboard for a session.
    pub async fn scoreboard(&self, session_id: &str) -> GameResult<Vec<ScoreboardEntry>> {
        let handle = self.handle(session_id).await?;
        let game = handle.game.lock().await;
        Ok(game.scoreboard())
    }

    /// Reconnect snapshot: session, roster, and the current round if any.
    pub async fn session_state(
        &self,
        session_id: &str,
    ) -> GameResult<(Session, Vec<Participant>, Option<Round>)> {
        let handle = self.handle(session_id).await?;
        let game = handle.game.lock().await;
        Ok((
            game.session.clone(),
            game.participants.values().cloned().collect(),
            game.current_round().cloned(),
        ))
    }
}

fn new_participant(session: &Session, name: String) -> Participant {
    Participant {
        id: ulid::Ulid::new().to_string(),
        session_id: session.id.clone(),
        name,
        is_team: session.game_mode == GameMode::Team,
        total_score: 0,
        consecutive_correct_answers: 0,
        consecutive_first_buzzes: 0,
        blocked_for_next_round: false,
        block_served: false,
        buzzed_in_current_round: false,
        buzzer_press_count: 0,
        is_connected: true,
        last_heartbeat: None,
    }
}

/// Broadcast the ranked scoreboard, truncated to the session's limit.
pub(super) fn emit_scoreboard(handle: &super::SessionHandle, game: &GameState) {
    let mut scores = game.scoreboard();
    scores.truncate(game.session.scoreboard_limit);
    handle.emit(GameEvent::now(
        game.session.id.clone(),
        GameEventKind::ScoreboardUpdated { scores },
    ));
}
