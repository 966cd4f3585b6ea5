use thiserror::Error;

/// Rejected intents. None of these are fatal; the transport decides which to surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("game is full: a player is already active in this world")]
    WorldFull,
    #[error("no active player for this connection")]
    NoActivePlayer,
    #[error("split rejected: {0}")]
    SplitRejected(&'static str),
}
