//! Errors returned when an action cannot be performed.

use crate::game::GameState;
use crate::students::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error category sent to clients alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    DuplicateNickname,
    InvalidNickname,
    LobbyFull,
    /// Malformed or unrecognized action
    InvalidMove,
    InvalidPlayer,
    NotRoundOwner,
    WrongState,
    /// Bad index, missing student, full hall, ...
    Structural,
    RuleViolation,
    InsufficientBalance,
    MatchAborted,
}

/// Legality failures of a single action. The game is never modified when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("malformed action: {0}")]
    InvalidMove(String),

    #[error("{nickname} is not a player of this game")]
    InvalidPlayer { nickname: String },

    #[error("{nickname} is not the round owner")]
    NotRoundOwner { nickname: String },

    #[error("{nickname} did not activate this card")]
    NotActivator { nickname: String },

    #[error("action not allowed while the game is in state {state:?}")]
    WrongState { state: GameState },

    #[error("invalid {what} index {index}, {len} available")]
    InvalidIndex {
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("no {color:?} student available")]
    MissingStudent { color: Color },

    #[error("hall row for {color:?} is full")]
    HallFull { color: Color },

    #[error("swapping a {color:?} student for another {color:?} changes nothing")]
    SameColorSwap { color: Color },

    #[error("cloud {index} is empty")]
    EmptyCloud { index: usize },

    #[error("mother nature can move 1 to {max} steps, not {steps}")]
    InvalidMovement { steps: usize, max: usize },

    #[error("no assistant card with value {value} in hand")]
    CardNotInHand { value: u8 },

    #[error("assistant card {value} was already played this round")]
    CardAlreadyPlayed { value: u8 },

    #[error("magician {magician} is already taken")]
    MagicianTaken { magician: u8 },

    #[error("not enough coins: {required} required, {available} available")]
    InsufficientBalance { required: u32, available: u32 },

    #[error("character cards are only available in expert mode")]
    NotExpertMode,

    #[error("a character card is already active")]
    CardAlreadyActive,

    #[error("a character card was already activated this turn")]
    CardAlreadyUsedThisTurn,

    #[error("this character card is not active")]
    CardNotActive,

    #[error("no no-entry tiles left on the card")]
    NoEntryTilesLeft,

    #[error("a game needs 2 or 3 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("duplicate nickname {0}")]
    DuplicateNickname(String),
}

impl GameError {
    /// Category of this error on the wire
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidMove(_) => ErrorKind::InvalidMove,
            GameError::InvalidPlayer { .. } => ErrorKind::InvalidPlayer,
            GameError::NotRoundOwner { .. } | GameError::NotActivator { .. } => {
                ErrorKind::NotRoundOwner
            }
            GameError::WrongState { .. } => ErrorKind::WrongState,
            GameError::InvalidIndex { .. }
            | GameError::MissingStudent { .. }
            | GameError::HallFull { .. }
            | GameError::SameColorSwap { .. }
            | GameError::EmptyCloud { .. }
            | GameError::InvalidMovement { .. }
            | GameError::CardNotInHand { .. } => ErrorKind::Structural,
            GameError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            GameError::DuplicateNickname(_) => ErrorKind::DuplicateNickname,
            GameError::CardAlreadyPlayed { .. }
            | GameError::MagicianTaken { .. }
            | GameError::NotExpertMode
            | GameError::CardAlreadyActive
            | GameError::CardAlreadyUsedThisTurn
            | GameError::CardNotActive
            | GameError::NoEntryTilesLeft
            | GameError::InvalidPlayerCount(_) => ErrorKind::RuleViolation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = GameError::InvalidIndex {
            what: "island",
            index: 14,
            len: 12,
        };
        assert_eq!(err.to_string(), "invalid island index 14, 12 available");

        let err = GameError::InsufficientBalance {
            required: 3,
            available: 1,
        };
        assert_eq!(err.to_string(), "not enough coins: 3 required, 1 available");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GameError::NotActivator {
                nickname: "Fede".into()
            }
            .kind(),
            ErrorKind::NotRoundOwner
        );
        assert_eq!(
            GameError::HallFull { color: Color::Red }.kind(),
            ErrorKind::Structural
        );
        assert_eq!(GameError::CardAlreadyActive.kind(), ErrorKind::RuleViolation);
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GameError>();
    }
}
