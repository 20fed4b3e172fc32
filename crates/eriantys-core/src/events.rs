//! Model change events.
//!
//! Every mutation of a `Game` appends one of these to the game's outgoing
//! queue. Each carries just enough to apply the change on a remote copy.

use crate::characters::CharacterCard;
use crate::game::{Cloud, GameState};
use crate::islands::Island;
use crate::player::{AssistantCard, School};
use crate::students::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ModelEvent {
    /// The game moved to a new phase
    GameState { state: GameState },

    /// A different player now owns the round
    RoundOwner { nickname: String },

    /// Cloud contents changed
    Clouds { clouds: Vec<Cloud> },

    /// A player's school changed (entry, hall or towers)
    School { nickname: String, school: School },

    /// A player's hand or played card changed
    Hand {
        nickname: String,
        hand: Vec<AssistantCard>,
        played: Option<AssistantCard>,
    },

    /// Mother nature now stands at this ring position
    MotherNature { position: usize },

    /// Students, owner or no-entry tiles of one island changed
    Island { position: usize, island: Island },

    /// Two neighbouring islands were joined (positions before the join)
    IslandsMerged { survivor: usize, absorbed: usize },

    /// Professor ownership changed
    Professors { professors: BTreeMap<Color, String> },

    /// A player's coins or the shared bank changed
    Coins {
        nickname: String,
        coins: u32,
        bank: u32,
    },

    /// Character card state changed (price, active flag, card contents)
    Characters { cards: Vec<CharacterCard> },

    /// The game is over; `None` means a draw
    GameOver { winner: Option<String> },
}

