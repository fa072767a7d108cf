use super::buzzer::reset_for_new_round;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::{BuzzingClosedReason, GameEvent, GameEventKind};
use crate::types::*;
use crate::verses::Direction;

impl AppState {
    /// Open the next round: pick an unused verse, resolve its context, and
    /// reset per-round participant state. Exactly one round may be open at a
    /// time.
    pub async fn open_round(
        &self,
        session_id: &str,
        question_type: Option<QuestionType>,
        reciter: Option<&str>,
    ) -> GameResult<Round> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        if game.session.status != SessionStatus::Active {
            return Err(GameError::InvalidState(
                "rounds can only be opened in an active session".into(),
            ));
        }
        if let Some(open) = game.open_round_id() {
            return Err(GameError::InvalidState(format!(
                "round {} is still open",
                open
            )));
        }

        let question_type = match question_type {
            Some(qt) => {
                if !game.session.question_types.contains(&qt) {
                    return Err(GameError::InvalidArgument(format!(
                        "question type {:?} is not enabled for this session",
                        qt
                    )));
                }
                qt
            }
            None => game.session.question_types[0],
        };

        let used = game.used_locators();
        let verse = self
            .sequencer
            .next_verse(&game.session.selection, &used)
            .await?;

        let (previous_verse, next_verse) = if question_type.needs_neighbors() {
            (
                self.sequencer.neighbor(verse.locator, Direction::Backward).await,
                self.sequencer.neighbor(verse.locator, Direction::Forward).await,
            )
        } else {
            (None, None)
        };

        let audio_url = self.sequencer.store().audio_url(verse.locator, reciter);

        let round = Round {
            id: ulid::Ulid::new().to_string(),
            session_id: session_id.to_string(),
            number: game.round_order.len() as u32 + 1,
            question_type,
            verse,
            audio_url,
            previous_verse,
            next_verse,
            opened_at: chrono::Utc::now().to_rfc3339(),
            closed_at: None,
            buzzing_closed: false,
        };

        for participant in game.participants.values_mut() {
            reset_for_new_round(participant);
        }

        game.round_order.push(round.id.clone());
        game.rounds.insert(round.id.clone(), round.clone());

        tracing::info!(
            "Opened round {} ({:?}, verse {}) in session {}",
            round.number,
            question_type,
            round.verse.locator,
            session_id
        );

        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::RoundOpened {
                round: round.clone(),
                timer_seconds: game.session.timer_seconds,
            },
        ));

        Ok(round)
    }

    /// Close a round. Safe to call after the slot-fill path already stopped
    /// buzzing; closing twice is an error.
    pub async fn close_round(&self, session_id: &str, round_id: &str) -> GameResult<Round> {
        let handle = self.handle(session_id).await?;
        let mut game = handle.game.lock().await;

        let total_buzzes = game.press_count_for_round(round_id);
        let round = game
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| GameError::NotFound("Round", round_id.to_string()))?;

        if round.closed_at.is_some() {
            return Err(GameError::AlreadyClosed);
        }

        // The timer path reaches here with buzzing still open; the slot-fill
        // path already announced the close.
        let announce_buzzing_closed = !round.buzzing_closed;
        round.buzzing_closed = true;
        round.closed_at = Some(chrono::Utc::now().to_rfc3339());
        let round = round.clone();

        tracing::info!(
            "Closed round {} in session {} after {} buzzes",
            round.number,
            session_id,
            total_buzzes
        );

        if announce_buzzing_closed {
            handle.emit(GameEvent::now(
                session_id,
                GameEventKind::BuzzingClosed {
                    round_id: round_id.to_string(),
                    reason: BuzzingClosedReason::TimerExpired,
                    total_buzzes,
                },
            ));
        }
        handle.emit(GameEvent::now(
            session_id,
            GameEventKind::RoundClosed {
                round_id: round_id.to_string(),
                round_number: round.number,
                closed_at: round.closed_at.clone().unwrap_or_default(),
            },
        ));

        Ok(round)
    }
}
