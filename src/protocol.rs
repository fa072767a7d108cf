use crate::error::{GameError, GameResult};
use crate::scoring::ScoreBreakdown;
use crate::types::*;
use crate::verses::validate_selection;
use serde::{Deserialize, Serialize};

/// Session configuration as sent by the admin client. Range and juz arrive
/// as raw optional fields and are validated exactly once, here, before
/// anything reaches the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub surah_range_start: Option<u16>,
    pub surah_range_end: Option<u16>,
    pub juz_number: Option<u8>,
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    #[serde(default)]
    pub question_types: Option<Vec<QuestionType>>,
    #[serde(default)]
    pub scoreboard_limit: Option<usize>,
    #[serde(default)]
    pub participant_names: Vec<String>,
}

impl CreateSessionRequest {
    /// Resolve the mutually-exclusive range/juz fields into a selection.
    pub fn selection(&self) -> GameResult<VerseSelection> {
        let has_range = self.surah_range_start.is_some() || self.surah_range_end.is_some();
        let has_juz = self.juz_number.is_some();

        let selection = match (has_range, has_juz) {
            (true, true) => {
                return Err(GameError::InvalidConfig(
                    "specify either a surah range or a juz, not both".into(),
                ))
            }
            (false, false) => {
                return Err(GameError::InvalidConfig(
                    "either a surah range or a juz is required".into(),
                ))
            }
            (true, false) => {
                let (Some(start), Some(end)) = (self.surah_range_start, self.surah_range_end)
                else {
                    return Err(GameError::InvalidConfig(
                        "surah range requires both start and end".into(),
                    ));
                };
                VerseSelection::SurahRange { start, end }
            }
            (false, true) => VerseSelection::Juz {
                number: self.juz_number.unwrap(),
            },
        };

        validate_selection(&selection)?;
        Ok(selection)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateSession {
        config: CreateSessionRequest,
    },
    AddParticipant {
        session_id: SessionId,
        name: String,
    },
    StartSession {
        session_id: SessionId,
    },
    OpenRound {
        session_id: SessionId,
        #[serde(default)]
        question_type: Option<QuestionType>,
        #[serde(default)]
        reciter: Option<String>,
    },
    PressBuzzer {
        session_id: SessionId,
        round_id: RoundId,
        participant_id: ParticipantId,
        client_elapsed_seconds: f64,
    },
    /// Admin hands the answer turn to the lowest-ranked presser who has not
    /// had one yet.
    GiveChance {
        session_id: SessionId,
        round_id: RoundId,
    },
    RecordAnswer {
        session_id: SessionId,
        press_id: PressId,
        text: String,
        #[serde(default)]
        is_correct: Option<bool>,
    },
    ValidateAnswer {
        session_id: SessionId,
        round_id: RoundId,
        participant_id: ParticipantId,
        is_correct: bool,
        #[serde(default)]
        admin_bonus: Option<u32>,
    },
    CloseRound {
        session_id: SessionId,
        round_id: RoundId,
    },
    EndSession {
        session_id: SessionId,
    },
    Heartbeat {
        session_id: SessionId,
        participant_id: ParticipantId,
    },
    /// Admin grants flat points outside answer validation.
    AwardBonus {
        session_id: SessionId,
        participant_id: ParticipantId,
        points: u32,
    },
    /// Admin override for the automatic one-round block.
    SetParticipantBlock {
        session_id: SessionId,
        participant_id: ParticipantId,
        blocked: bool,
    },
    /// State re-fetch after reconnect; missed events are not replayed.
    GetSession {
        session_id: SessionId,
    },
    GetScoreboard {
        session_id: SessionId,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuzzingClosedReason {
    TimerExpired,
    SlotsFilled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    AdminEnded,
}

/// Every event shares this header; the payload variant rides alongside via
/// the `t` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub session_id: SessionId,
    /// RFC3339 server timestamp.
    pub at: String,
    #[serde(flatten)]
    pub kind: GameEventKind,
}

impl GameEvent {
    pub fn now(session_id: impl Into<SessionId>, kind: GameEventKind) -> Self {
        Self {
            session_id: session_id.into(),
            at: chrono::Utc::now().to_rfc3339(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum GameEventKind {
    SessionCreated {
        session: Session,
        participants: Vec<Participant>,
    },
    ParticipantJoined {
        participant: Participant,
    },
    SessionStarted {
        session: Session,
    },
    RoundOpened {
        round: Round,
        timer_seconds: u32,
    },
    BuzzerPressed {
        press_id: PressId,
        participant_id: ParticipantId,
        participant_name: String,
        buzz_rank: u32,
        latency_seconds: f64,
        remaining_slots: u32,
    },
    BuzzingClosed {
        round_id: RoundId,
        reason: BuzzingClosedReason,
        total_buzzes: u32,
    },
    /// It is now this presser's turn to answer.
    AnswerTurn {
        round_id: RoundId,
        press_id: PressId,
        participant_id: ParticipantId,
        participant_name: String,
        buzz_rank: u32,
    },
    AnswerRecorded {
        press_id: PressId,
        participant_id: ParticipantId,
    },
    AnswerValidated {
        round_id: RoundId,
        participant_id: ParticipantId,
        participant_name: String,
        is_correct: bool,
        breakdown: ScoreBreakdown,
        total_score: u32,
    },
    ScoreboardUpdated {
        scores: Vec<ScoreboardEntry>,
    },
    BonusAwarded {
        participant_id: ParticipantId,
        participant_name: String,
        points: u32,
        total_score: u32,
    },
    /// A participant hit the consecutive-first-buzz threshold and sits out
    /// the next round.
    ParticipantBlocked {
        participant_id: ParticipantId,
        participant_name: String,
    },
    RoundClosed {
        round_id: RoundId,
        round_number: u32,
        closed_at: String,
    },
    SessionEnded {
        reason: SessionEndReason,
        total_rounds: u32,
        final_scores: Vec<ScoreboardEntry>,
        winner: Option<ScoreboardEntry>,
    },
    /// Direct reply to `GetSession`; also serves as the reconnect snapshot.
    SessionState {
        session: Session,
        participants: Vec<Participant>,
        current_round: Option<Round>,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl GameEventKind {
    pub fn error(err: &GameError) -> Self {
        GameEventKind::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}
