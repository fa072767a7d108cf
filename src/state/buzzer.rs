use super::session::emit_scoreboard;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::{BuzzingClosedReason, GameEvent, GameEventKind};
use crate::types::*;

/// Anti-domination rule: a participant who takes rank 1 this many times in a
/// row sits out the next round. Any press at rank 2+ resets the run.
#[derive(Debug, Clone)]
pub struct ConsecutiveBuzzTracker {
    threshold: u32,
}

impl ConsecutiveBuzzTracker {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Record a ranked press and return whether it tripped a block.
    pub fn observe(&self, participant: &mut Participant, buzz_rank: u32) -> bool {
        if buzz_rank == 1 {
            participant.consecutive_first_buzzes += 1;
            if participant.consecutive_first_buzzes >= self.threshold {
                participant.blocked_for_next_round = true;
                participant.block_served = false;
                participant.consecutive_first_buzzes = 0;
                return true;
            }
        } else {
            participant.consecutive_first_buzzes = 0;
        }
        false
    }
}

/// Per-participant reset applied when a round opens. Blocks last exactly one
/// round: a block that was in force during the previous round clears now, a
/// freshly tripped block starts being served now.
pub(super) fn reset_for_new_round(participant: &mut Participant) {
    participant.buzzed_in_current_round = false;
    if participant.blocked_for_next_round {
        if participant.block_served {
            participant.blocked_for_next_round = false;
            participant.block_served = false;
        } else {
            participant.block_served = true;
        }
    }
}

impl AppState {
    /// Register a buzzer press and assign its rank. Rank assignment happens
    /// under the session lock, so concurrent presses always receive dense,
    /// distinct ranks in arrival order.
    pub async fn press_buzzer(
        &self,
        session_id: &str,
        round_id: &str,
        participant_id: &str,
        client_elapsed_seconds: f64,
    ) -> GameResult<BuzzerPress> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        if !game.participants.contains_key(participant_id) {
            // A participant registered in another session gets WrongSession
            // rather than NotFound.
            drop(game);
            return Err(self.classify_unknown_participant(participant_id).await);
        }

        let participant = &game.participants[participant_id];
        if participant.blocked_for_next_round {
            return Err(GameError::Blocked);
        }

        let round = game
            .rounds
            .get(round_id)
            .ok_or_else(|| GameError::NotFound("Round", round_id.to_string()))?;
        if !round.is_open() {
            return Err(GameError::RoundClosed);
        }

        let participant = &game.participants[participant_id];
        if !participant.is_connected {
            return Err(GameError::Disconnected);
        }
        if participant.buzzed_in_current_round {
            return Err(GameError::AlreadyPressed);
        }

        let rank = game.press_count_for_round(round_id) + 1;
        if rank > self.rules.max_ranked_slots {
            return Err(GameError::SlotsFull);
        }

        let press = BuzzerPress {
            id: ulid::Ulid::new().to_string(),
            round_id: round_id.to_string(),
            participant_id: participant_id.to_string(),
            buzz_rank: rank,
            latency_seconds: client_elapsed_seconds,
            pressed_at: chrono::Utc::now().to_rfc3339(),
            got_chance: false,
            answer_text: None,
            answer_submitted_at: None,
            is_correct: None,
            points_awarded: 0,
        };
        game.presses.insert(press.id.clone(), press.clone());

        let participant = game
            .participants
            .get_mut(participant_id)
            .expect("participant checked above");
        participant.buzzed_in_current_round = true;
        participant.buzzer_press_count += 1;
        let now_blocked = self.tracker.observe(participant, rank);
        let participant_name = participant.name.clone();

        tracing::info!(
            "{} buzzed at rank {} ({:.2}s) in round {}",
            participant_name,
            rank,
            client_elapsed_seconds,
            round_id
        );

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::BuzzerPressed {
                press_id: press.id.clone(),
                participant_id: participant_id.to_string(),
                participant_name: participant_name.clone(),
                buzz_rank: rank,
                latency_seconds: client_elapsed_seconds,
                remaining_slots: self.rules.max_ranked_slots - rank,
            },
        ));

        if now_blocked {
            tracing::info!(
                "{} blocked for the next round after consecutive first buzzes",
                participant_name
            );
            handle.emit(GameEvent::now(
                session_id,
                GameEventKind::ParticipantBlocked {
                    participant_id: participant_id.to_string(),
                    participant_name,
                },
            ));
        }

        if rank == self.rules.max_ranked_slots {
            if let Some(round) = game.rounds.get_mut(round_id) {
                round.buzzing_closed = true;
            }
            handle.emit(GameEvent::now(
                session_id,
                GameEventKind::BuzzingClosed {
                    round_id: round_id.to_string(),
                    reason: BuzzingClosedReason::SlotsFilled,
                    total_buzzes: rank,
                },
            ));
            emit_scoreboard(&handle, &game);
        }

        Ok(press)
    }

    /// Hand the answer turn to the next presser in line: the lowest-ranked
    /// press in the round that has not had its chance yet.
    pub async fn give_chance(&self, session_id: &str, round_id: &str) -> GameResult<BuzzerPress> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        if !game.rounds.contains_key(round_id) {
            return Err(GameError::NotFound("Round", round_id.to_string()));
        }

        let next = game
            .presses
            .values_mut()
            .filter(|p| p.round_id == round_id && !p.got_chance)
            .min_by_key(|p| p.buzz_rank)
            .ok_or_else(|| {
                GameError::InvalidState(format!("no press waiting in round {}", round_id))
            })?;

        next.got_chance = true;
        let press = next.clone();

        let participant_name = game
            .participants
            .get(&press.participant_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        tracing::info!(
            "{} got the answer turn (rank {}) in round {}",
            participant_name,
            press.buzz_rank,
            round_id
        );

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::AnswerTurn {
                round_id: round_id.to_string(),
                press_id: press.id.clone(),
                participant_id: press.participant_id.clone(),
                participant_name,
                buzz_rank: press.buzz_rank,
            },
        ));

        Ok(press)
    }

    /// Attach answer text to an existing press. Re-recording overwrites the
    /// previous text; the latest submission is the one that gets judged.
    pub async fn record_answer(
        &self,
        session_id: &str,
        press_id: &str,
        text: String,
        is_correct: Option<bool>,
    ) -> GameResult<BuzzerPress> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        let press = game
            .presses
            .get_mut(press_id)
            .ok_or_else(|| GameError::NotFound("BuzzerPress", press_id.to_string()))?;

        press.answer_text = Some(text);
        press.answer_submitted_at = Some(chrono::Utc::now().to_rfc3339());
        if is_correct.is_some() {
            press.is_correct = is_correct;
        }
        let press = press.clone();

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::AnswerRecorded {
                press_id: press.id.clone(),
                participant_id: press.participant_id.clone(),
            },
        ));

        Ok(press)
    }
}
