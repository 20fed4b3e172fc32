//! Character cards (expert mode).
//!
//! A card either installs a rule policy for the rest of the turn, or pushes
//! an interaction state the activator must resolve with a follow-up action.

use crate::error::GameError;
use crate::game::{Game, GameState};
use crate::rules::DynamicRules;
use crate::students::{Bag, Color, StudentSet};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// No-entry tiles the Grandma starts with
pub const GRANDMA_TILES: u32 = 4;

/// The twelve characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Character {
    Monk,
    Farmer,
    Herald,
    Postman,
    Grandma,
    Centaur,
    Joker,
    Knight,
    Mushroom,
    Minstrel,
    Princess,
    Thief,
}

impl Character {
    pub const ALL: [Character; 12] = [
        Character::Monk,
        Character::Farmer,
        Character::Herald,
        Character::Postman,
        Character::Grandma,
        Character::Centaur,
        Character::Joker,
        Character::Knight,
        Character::Mushroom,
        Character::Minstrel,
        Character::Princess,
        Character::Thief,
    ];

    /// Price printed on the card
    pub fn base_price(&self) -> u32 {
        match self {
            Character::Monk | Character::Postman | Character::Joker | Character::Minstrel => 1,
            Character::Farmer | Character::Grandma | Character::Knight | Character::Princess => 2,
            Character::Herald | Character::Centaur | Character::Mushroom | Character::Thief => 3,
        }
    }

    /// Students placed on the card at setup
    pub fn students_on_card(&self) -> u32 {
        match self {
            Character::Monk | Character::Princess => 4,
            Character::Joker => 6,
            _ => 0,
        }
    }

    /// Swaps allowed per activation
    pub fn swaps(&self) -> u32 {
        match self {
            Character::Joker => 3,
            Character::Minstrel => 2,
            _ => 0,
        }
    }

    /// State the activator is moved to, for cards that need a follow-up
    pub fn interaction_state(&self) -> Option<GameState> {
        match self {
            Character::Grandma => Some(GameState::GrandmaBlockIsland),
            Character::Herald => Some(GameState::HeraldChooseIsland),
            Character::Joker => Some(GameState::JokerSwapStudents),
            Character::Minstrel => Some(GameState::MinstrelSwapStudents),
            Character::Monk => Some(GameState::MonkMoveToIsland),
            Character::Mushroom => Some(GameState::MushroomChooseColor),
            Character::Princess => Some(GameState::PrincessMoveToHall),
            Character::Thief => Some(GameState::ThiefChooseColor),
            Character::Farmer | Character::Postman | Character::Centaur | Character::Knight => {
                None
            }
        }
    }

    /// Rule policy installed while the card is active
    pub fn policy(&self, activator: &str) -> Option<DynamicRules> {
        match self {
            Character::Centaur => Some(DynamicRules::Centaur),
            Character::Postman => Some(DynamicRules::Postman),
            Character::Knight => Some(DynamicRules::Knight {
                beneficiary: activator.to_string(),
            }),
            Character::Farmer => Some(DynamicRules::Farmer {
                beneficiary: activator.to_string(),
            }),
            Character::Mushroom => Some(DynamicRules::Mushroom { excluded: None }),
            _ => None,
        }
    }
}

/// A character card in play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCard {
    pub character: Character,
    /// Current price (+1 after the first activation)
    pub price: u32,
    pub active: bool,
    /// Whether the card has been activated at least once this match
    pub used: bool,
    pub activator: Option<String>,
    /// State to return to once the interaction is resolved
    pub previous_state: Option<GameState>,
    pub students: StudentSet,
    pub no_entry_tiles: u32,
    pub swaps_left: u32,
}

impl CharacterCard {
    pub fn new(character: Character) -> Self {
        Self {
            character,
            price: character.base_price(),
            active: false,
            used: false,
            activator: None,
            previous_state: None,
            students: StudentSet::new(),
            no_entry_tiles: 0,
            swaps_left: character.swaps(),
        }
    }

    /// Take the card's starting resources from the bag
    pub fn init<R: Rng>(&mut self, bag: &mut Bag, rng: &mut R) {
        self.students = bag.draw_many(self.character.students_on_card(), rng);
        if self.character == Character::Grandma {
            self.no_entry_tiles = GRANDMA_TILES;
        }
    }

    /// Clear everything that only lives for one activation
    pub fn reset_transient(&mut self) {
        self.active = false;
        self.activator = None;
        self.previous_state = None;
        self.swaps_left = self.character.swaps();
    }
}

impl Game {
    /// Whether `nickname` could activate the card at `index` right now,
    /// ignoring who owns the round and the current state
    pub(crate) fn check_activation(&self, nickname: &str, index: usize) -> Result<(), GameError> {
        if !self.expert_mode {
            return Err(GameError::NotExpertMode);
        }
        let card = self.characters.get(index).ok_or(GameError::InvalidIndex {
            what: "character card",
            index: index as i64,
            len: self.characters.len(),
        })?;
        if self.active_character().is_some() {
            return Err(GameError::CardAlreadyActive);
        }
        if self.round.card_activated_this_turn {
            return Err(GameError::CardAlreadyUsedThisTurn);
        }
        let available = self.player(nickname).map(|p| p.coins).unwrap_or(0);
        if available < card.price {
            return Err(GameError::InsufficientBalance {
                required: card.price,
                available,
            });
        }
        if card.character == Character::Grandma && card.no_entry_tiles == 0 {
            return Err(GameError::NoEntryTilesLeft);
        }
        Ok(())
    }

    /// Pay for and activate the card at `index`
    pub(crate) fn activate_character(&mut self, nickname: &str, index: usize) {
        let Some(card) = self.characters.get(index) else {
            return;
        };
        let price = card.price;
        let first_use = !card.used;
        let character = card.character;

        if let Some(player) = self.player_mut(nickname) {
            player.spend_coins(price);
        }
        // One coin stays on the card the first time it is used
        self.bank += if first_use { price - 1 } else { price };

        let state = self.state;
        if let Some(card) = self.characters.get_mut(index) {
            if first_use {
                card.used = true;
                card.price += 1;
            }
            card.active = true;
            card.activator = Some(nickname.to_string());
            if character.interaction_state().is_some() {
                card.previous_state = Some(state);
            }
        }
        self.round.card_activated_this_turn = true;

        if let Some(policy) = character.policy(nickname) {
            self.rules = policy;
        }
        if character == Character::Farmer {
            self.update_all_professors();
        }

        self.notify_coins(nickname);
        self.notify_characters();

        if let Some(sub_state) = character.interaction_state() {
            self.transition(sub_state);
        }
    }

    /// Deactivate the card at `index`, dropping its policy and returning to
    /// the state it interrupted if its interaction is still pending
    pub(crate) fn deactivate_character(&mut self, index: usize) {
        let Some(card) = self.characters.get_mut(index) else {
            return;
        };
        if !card.active {
            return;
        }
        let previous = card.previous_state;
        card.reset_transient();

        self.rules = DynamicRules::Base;
        self.notify_characters();

        if let Some(previous) = previous {
            if self.state != GameState::GameEnded {
                self.transition(previous);
            }
        }
    }

    /// Resolve the Mushroom interaction: keep the card active with `color`
    /// excluded and go back to the interrupted state
    pub(crate) fn choose_mushroom_color(&mut self, index: usize, color: Color) {
        self.rules = DynamicRules::Mushroom {
            excluded: Some(color),
        };
        let previous = self
            .characters
            .get_mut(index)
            .and_then(|card| card.previous_state.take());
        self.notify_characters();
        if let Some(previous) = previous {
            self.transition(previous);
        }
    }

    /// Put one student from the bag back on the card at `index`
    pub(crate) fn refill_character(&mut self, index: usize) {
        let drawn = self.draw_students(1);
        if let Some(card) = self.characters.get_mut(index) {
            card.students.add_set(&drawn);
        }
    }
}
