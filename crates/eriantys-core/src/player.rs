//! Player state: school, assistant cards and coins.
//!
//! This module contains:
//! - Player struct keyed by nickname
//! - School with entry, hall and tower stock
//! - Assistant cards and their mother-nature movement

use crate::students::{Color, StudentSet};
use serde::{Deserialize, Serialize};

/// Maximum students of one color in a hall
pub const HALL_CAPACITY: u32 = 10;

/// Number of magicians (card backs) to choose from
pub const MAGICIANS: u8 = 4;

/// Tower color for a seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TowerColor {
    White,
    Black,
    Grey,
}

impl TowerColor {
    /// Get tower color for a seat index
    pub fn for_seat(seat: usize) -> Self {
        match seat % 3 {
            0 => TowerColor::White,
            1 => TowerColor::Black,
            _ => TowerColor::Grey,
        }
    }
}

/// An assistant card, played once per round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssistantCard {
    /// Turn-order value (1-10), lower acts first
    pub value: u8,
    /// Maximum mother-nature steps
    pub movement: u8,
}

impl AssistantCard {
    /// Create the card with the given value
    pub fn new(value: u8) -> Self {
        Self {
            value,
            movement: value.div_ceil(2),
        }
    }

    /// The full hand every player starts with
    pub fn full_hand() -> Vec<AssistantCard> {
        (1..=10).map(AssistantCard::new).collect()
    }
}

/// A player's school board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub entry: StudentSet,
    pub hall: StudentSet,
    /// Towers still in the school (not yet on islands)
    pub towers: u32,
    pub tower_color: TowerColor,
}

impl School {
    pub fn new(towers: u32, tower_color: TowerColor, entry: StudentSet) -> Self {
        Self {
            entry,
            hall: StudentSet::new(),
            towers,
            tower_color,
        }
    }

    /// Whether the hall has room for another student of `color`
    pub fn hall_has_room(&self, color: Color) -> bool {
        self.hall.get(color) < HALL_CAPACITY
    }

    /// Seat a student in the hall.
    ///
    /// Returns true when the new student lands on a coin space (3rd, 6th, 9th).
    pub fn add_to_hall(&mut self, color: Color) -> bool {
        self.hall.add(color, 1);
        self.hall.get(color) % 3 == 0
    }

    /// Place a tower on an island, saturating at zero
    pub fn take_tower(&mut self) {
        self.towers = self.towers.saturating_sub(1);
    }

    /// Get a tower back from an island
    pub fn return_tower(&mut self) {
        self.towers += 1;
    }
}

/// A player in the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique nickname, used for every lookup
    pub nickname: String,
    /// Seat index (0-based, clockwise)
    pub seat: usize,
    /// Chosen magician, set during setup
    pub magician: Option<u8>,
    pub school: School,
    /// Assistant cards still in hand
    pub hand: Vec<AssistantCard>,
    /// Card played this round
    pub played_card: Option<AssistantCard>,
    /// Coins (expert mode only)
    pub coins: u32,
}

impl Player {
    pub fn new(nickname: impl Into<String>, seat: usize, school: School) -> Self {
        Self {
            nickname: nickname.into(),
            seat,
            magician: None,
            school,
            hand: AssistantCard::full_hand(),
            played_card: None,
            coins: 0,
        }
    }

    /// Whether a card with this value is still in hand
    pub fn has_card(&self, value: u8) -> bool {
        self.hand.iter().any(|c| c.value == value)
    }

    /// Move a card from hand to the table
    pub fn play_card(&mut self, value: u8) -> Option<AssistantCard> {
        let pos = self.hand.iter().position(|c| c.value == value)?;
        let card = self.hand.remove(pos);
        self.played_card = Some(card);
        Some(card)
    }

    /// Spend coins; returns false if the balance is too low
    pub fn spend_coins(&mut self, amount: u32) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        true
    }
}
