use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type SessionId = String;
pub type RoundId = String;
pub type ParticipantId = String;
pub type PressId = String;

/// A verse address: surah 1-114, ayah 1-based within the surah.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseLocator {
    pub surah: u16,
    pub ayah: u16,
}

impl VerseLocator {
    pub fn new(surah: u16, ayah: u16) -> Self {
        Self { surah, ayah }
    }
}

impl std::fmt::Display for VerseLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Setup,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Advisory round timer; the server does not enforce expiry itself.
    pub fn timer_seconds(&self) -> u32 {
        match self {
            Difficulty::Easy => 90,
            Difficulty::Medium => 60,
            Difficulty::Hard => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Team,
    Individual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    GuessSurah,
    GuessMeaning,
    GuessNextAyat,
    GuessPreviousAyat,
    GuessReciter,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::GuessSurah,
        QuestionType::GuessMeaning,
        QuestionType::GuessNextAyat,
        QuestionType::GuessPreviousAyat,
        QuestionType::GuessReciter,
    ];

    /// Question types that also show a neighboring verse on the round.
    pub fn needs_neighbors(&self) -> bool {
        matches!(
            self,
            QuestionType::GuessNextAyat | QuestionType::GuessPreviousAyat
        )
    }
}

/// Verse selection domain for a session. Exactly one of the two forms,
/// enforced at session creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerseSelection {
    SurahRange { start: u16, end: u16 },
    Juz { number: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,
    pub selection: VerseSelection,
    pub difficulty: Difficulty,
    pub timer_seconds: u32,
    pub game_mode: GameMode,
    pub question_types: Vec<QuestionType>,
    pub scoreboard_limit: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub session_id: SessionId,
    pub name: String,
    pub is_team: bool,
    pub total_score: u32,
    pub consecutive_correct_answers: u32,
    pub consecutive_first_buzzes: u32,
    pub blocked_for_next_round: bool,
    /// True once the one-round block has been carried into an open round;
    /// the following round-open clears both flags.
    #[serde(skip)]
    pub block_served: bool,
    pub buzzed_in_current_round: bool,
    pub buzzer_press_count: u32,
    pub is_connected: bool,
    pub last_heartbeat: Option<String>,
}

/// Verse content as returned by the content-lookup collaborator. Text and
/// translation are optional metadata; the locator is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verse {
    pub locator: VerseLocator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surah_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub session_id: SessionId,
    pub number: u32,
    pub question_type: QuestionType,
    pub verse: Verse,
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_verse: Option<Verse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_verse: Option<Verse>,
    pub opened_at: String,
    pub closed_at: Option<String>,
    /// Set once the last ranked slot fills, so a later timer-driven close
    /// does not announce the end of the buzzing phase a second time.
    #[serde(skip)]
    pub buzzing_closed: bool,
}

impl Round {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuzzerPress {
    pub id: PressId,
    pub round_id: RoundId,
    pub participant_id: ParticipantId,
    /// Dense 1-based arrival rank, unique within the round.
    pub buzz_rank: u32,
    /// Client-reported seconds elapsed since round start.
    pub latency_seconds: f64,
    pub pressed_at: String,
    /// True once the admin has given this presser their turn to answer.
    pub got_chance: bool,
    pub answer_text: Option<String>,
    pub answer_submitted_at: Option<String>,
    pub is_correct: Option<bool>,
    pub points_awarded: u32,
}

/// One line of a ranked scoreboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub participant_id: ParticipantId,
    pub name: String,
    pub total_score: u32,
    pub rank: u32,
    pub is_connected: bool,
    pub blocked_for_next_round: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Player,
}
