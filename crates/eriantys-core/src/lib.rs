//! Eriantys - authoritative game engine
//!
//! This crate provides the core game logic for Eriantys, including:
//! - Students, the bag, schools and assistant cards
//! - The circular island ring with merge-on-conquest
//! - Influence and professor rules, swappable by character cards
//! - The action pipeline and the round/turn state machine
//! - Typed change events for every mutation
//!
//! # Architecture
//!
//! The engine does no I/O. A host builds a [`Game`], feeds it [`Action`]s and
//! forwards the [`ModelEvent`]s each action returns to its observers.
//!
//! # Modules
//!
//! - [`students`]: colors, student counts and the bag
//! - [`player`]: schools, assistant cards and players
//! - [`islands`]: island arena and ring
//! - [`rules`]: table rules and the active rule policy
//! - [`characters`]: the twelve character cards
//! - [`game`]: game state and shared mutations
//! - [`round`]: planning/action phases and end of game
//! - [`actions`]: action payloads and the dispatch table
//! - [`events`]: model change events
//! - [`invariants`]: consistency checks run by the server

pub mod actions;
pub mod characters;
pub mod error;
pub mod events;
pub mod game;
pub mod invariants;
pub mod islands;
pub mod player;
pub mod round;
pub mod rules;
pub mod students;

// Re-export commonly used types
pub use actions::{Action, ActionKind, ActionPayload};
pub use characters::{Character, CharacterCard};
pub use error::{ErrorKind, GameError};
pub use events::ModelEvent;
pub use game::{Cloud, Game, GameState};
pub use invariants::{check_invariants, InvariantViolation};
pub use islands::{Island, IslandContainer, IslandMerge};
pub use player::{AssistantCard, Player, School, TowerColor};
pub use round::RoundTracker;
pub use rules::{DynamicRules, TableRules};
pub use students::{Bag, Color, StudentSet};
