mod buzzer;
mod round;
mod session;

pub use buzzer::ConsecutiveBuzzTracker;

use crate::error::{GameError, GameResult};
use crate::protocol::GameEvent;
use crate::scoring::ScoringConfig;
use crate::types::*;
use crate::verses::{VerseSequencer, VerseStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Tunable gameplay rules, injected rather than hardcoded.
#[derive(Debug, Clone)]
pub struct GameRules {
    /// Ranked buzzer slots per round; presses past this are rejected.
    pub max_ranked_slots: u32,
    /// Consecutive rank-1 buzzes before a one-round block.
    pub consecutive_first_buzz_threshold: u32,
    pub default_scoreboard_limit: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_ranked_slots: 3,
            consecutive_first_buzz_threshold: 3,
            default_scoreboard_limit: 5,
        }
    }
}

/// All mutable state of one session. Guarded by the session's mutex, so
/// every read-then-write (rank assignment, streaks, scores) serializes per
/// session while distinct sessions never contend.
#[derive(Debug)]
pub struct GameState {
    pub session: Session,
    pub participants: HashMap<ParticipantId, Participant>,
    pub rounds: HashMap<RoundId, Round>,
    /// Round ids in creation order; drives gapless numbering and
    /// "current round" resolution.
    pub round_order: Vec<RoundId>,
    pub presses: HashMap<PressId, BuzzerPress>,
}

impl GameState {
    pub fn current_round(&self) -> Option<&Round> {
        self.round_order.last().and_then(|id| self.rounds.get(id))
    }

    pub fn open_round_id(&self) -> Option<RoundId> {
        self.round_order
            .iter()
            .find(|id| self.rounds.get(*id).is_some_and(|r| r.is_open()))
            .cloned()
    }

    pub fn used_locators(&self) -> std::collections::HashSet<VerseLocator> {
        self.rounds.values().map(|r| r.verse.locator).collect()
    }

    pub fn press_count_for_round(&self, round_id: &str) -> u32 {
        self.presses
            .values()
            .filter(|p| p.round_id == round_id)
            .count() as u32
    }

    pub fn press_for(&self, round_id: &str, participant_id: &str) -> Option<&BuzzerPress> {
        self.presses
            .values()
            .find(|p| p.round_id == round_id && p.participant_id == participant_id)
    }

    /// Participants ranked by score descending, with dense 1-based ranks.
    pub fn scoreboard(&self) -> Vec<ScoreboardEntry> {
        let mut participants: Vec<&Participant> = self.participants.values().collect();
        participants.sort_by(|a, b| b.total_score.cmp(&a.total_score).then(a.name.cmp(&b.name)));
        participants
            .iter()
            .enumerate()
            .map(|(i, p)| ScoreboardEntry {
                participant_id: p.id.clone(),
                name: p.name.clone(),
                total_score: p.total_score,
                rank: i as u32 + 1,
                is_connected: p.is_connected,
                blocked_for_next_round: p.blocked_for_next_round,
            })
            .collect()
    }
}

/// Handle to one live session: its state plus its event fan-out channel.
#[derive(Debug)]
pub struct SessionHandle {
    pub game: Mutex<GameState>,
    events: broadcast::Sender<GameEvent>,
}

impl SessionHandle {
    fn new(game: GameState) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            game: Mutex::new(game),
            events: tx,
        }
    }

    /// Fire-and-forget fan-out. A lagging or absent receiver never blocks
    /// or fails the state mutation that produced the event.
    pub fn emit(&self, event: GameEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }
}

/// Shared application state: a registry of live sessions plus the
/// collaborators and configuration every session shares.
pub struct AppState {
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
    pub sequencer: VerseSequencer,
    pub scoring: ScoringConfig,
    pub rules: GameRules,
    pub tracker: ConsecutiveBuzzTracker,
}

impl AppState {
    pub fn new(store: Arc<dyn VerseStore>, scoring: ScoringConfig, rules: GameRules) -> Self {
        let tracker = ConsecutiveBuzzTracker::new(rules.consecutive_first_buzz_threshold);
        Self {
            sessions: RwLock::new(HashMap::new()),
            sequencer: VerseSequencer::new(store),
            scoring,
            rules,
            tracker,
        }
    }

    pub async fn handle(&self, session_id: &str) -> GameResult<Arc<SessionHandle>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| GameError::NotFound("Session", session_id.to_string()))
    }

    pub(crate) async fn insert_session(&self, game: GameState) -> Arc<SessionHandle> {
        let id = game.session.id.clone();
        let handle = Arc::new(SessionHandle::new(game));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn subscribe(&self, session_id: &str) -> GameResult<broadcast::Receiver<GameEvent>> {
        Ok(self.handle(session_id).await?.subscribe())
    }

    /// Distinguish a participant pressing into the wrong session from an id
    /// that does not exist at all. Must be called with no game lock held.
    pub(crate) async fn classify_unknown_participant(&self, participant_id: &str) -> GameError {
        let handles: Vec<Arc<SessionHandle>> =
            self.sessions.read().await.values().cloned().collect();
        for handle in handles {
            if handle
                .game
                .lock()
                .await
                .participants
                .contains_key(participant_id)
            {
                return GameError::WrongSession;
            }
        }
        GameError::NotFound("Participant", participant_id.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = app();
        let err = app.handle("nope").await.unwrap_err();
        assert!(matches!(err, GameError::NotFound("Session", _)));
    }

    #[tokio::test]
    async fn sessions_are_registered_and_subscribable() {
        let app = app();
        let (session, _) = app.create_session(&request(&["Aisha"])).await.unwrap();
        assert!(app.handle(&session.id).await.is_ok());
        assert!(app.subscribe(&session.id).await.is_ok());
    }
}
