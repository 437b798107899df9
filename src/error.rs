use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

// Enum for handling various application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Game error: {0:#}")]
    Game(#[from] GameError), // Errors from the turn/prompt state machine.

    #[error("Content error: {0:#}")]
    Content(#[from] ContentLoadError), // Errors while loading deck content.

    #[error("Serialization error: {0:#}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0:#}")]
    IO(#[from] std::io::Error),
}

// Errors from the per-channel turn/prompt state machine. All of these are
// recoverable: the adapter turns them into user-facing text and carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("No players have signed up yet")]
    EmptyQueue, // An operation needed a current player but the queue is empty.

    #[error("Need at least two players for that")]
    InsufficientPlayers, // Peeking past the head with fewer than two players.

    #[error("Invalid configuration: {0:#}")]
    InvalidConfiguration(String), // Rejected end-condition input (non-positive).

    #[error("No unused prompts left to draw")]
    DrawExhausted, // Defensive: the end-condition checks preempt this in practice.
}

// Errors while loading a prompt deck from a content source. A failed load
// never replaces a running session; callers load fully, then swap.
#[derive(Debug, Error)]
pub enum ContentLoadError {
    #[error("Failed to read deck source: {0:#}")]
    Io(#[from] std::io::Error),

    #[error("Malformed deck source: {0:#}")]
    Malformed(#[from] serde_json::Error),

    #[error("Deck contains no prompts")]
    EmptyDeck,

    #[error("Deck has no final prompt")]
    MissingFinal,
}
