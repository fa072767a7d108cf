/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors produced by session, round, and buzzer operations. All are local,
/// synchronous failures; none are retried and none corrupt committed state.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("Participant is blocked for this round")]
    Blocked,

    #[error("Participant already pressed in this round")]
    AlreadyPressed,

    #[error("All ranked buzzer slots are taken")]
    SlotsFull,

    #[error("Participant is disconnected")]
    Disconnected,

    #[error("Participant does not belong to this session")]
    WrongSession,

    #[error("Round is closed")]
    RoundClosed,

    #[error("Round already closed")]
    AlreadyClosed,

    #[error("No verses left in the selection domain")]
    Exhausted,
}

impl GameError {
    /// Stable machine-readable code surfaced in websocket error events.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidConfig(_) => "INVALID_CONFIG",
            GameError::InvalidArgument(_) => "INVALID_ARGUMENT",
            GameError::InvalidState(_) => "INVALID_STATE",
            GameError::NotFound(_, _) => "NOT_FOUND",
            GameError::Blocked => "BLOCKED",
            GameError::AlreadyPressed => "ALREADY_PRESSED",
            GameError::SlotsFull => "SLOTS_FULL",
            GameError::Disconnected => "DISCONNECTED",
            GameError::WrongSession => "WRONG_SESSION",
            GameError::RoundClosed => "ROUND_CLOSED",
            GameError::AlreadyClosed => "ALREADY_CLOSED",
            GameError::Exhausted => "EXHAUSTED",
        }
    }
}
