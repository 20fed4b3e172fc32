//! Scoring and movement rules.
//!
//! `TableRules` holds the fixed numbers that depend on the player count.
//! `DynamicRules` is the policy currently in force: the base rules, or the
//! variant installed by an active character card. It is a plain value stored
//! on the game, looked up whenever influence, professors or movement are
//! computed.

use crate::game::Game;
use crate::islands::Island;
use crate::player::AssistantCard;
use crate::students::Color;
use serde::{Deserialize, Serialize};

/// Coins in the shared bank at the start of an expert match
pub const INITIAL_BANK: u32 = 20;

/// Extra influence granted by the Knight
pub const KNIGHT_BONUS: u32 = 2;

/// Extra mother-nature steps granted by the Postman
pub const POSTMAN_EXTRA_MOVES: u8 = 2;

/// Numbers that depend on how many players sit at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRules {
    /// Students in a school entry at the start
    pub entry_size: u32,
    /// Towers per school
    pub towers: u32,
    /// Students moved per turn, also the cloud capacity
    pub students_per_turn: u32,
}

impl TableRules {
    /// Rules for a 2 or 3 player match
    pub fn for_players(players: usize) -> Option<TableRules> {
        match players {
            2 => Some(TableRules {
                entry_size: 7,
                towers: 8,
                students_per_turn: 3,
            }),
            3 => Some(TableRules {
                entry_size: 9,
                towers: 6,
                students_per_turn: 4,
            }),
            _ => None,
        }
    }
}

/// The influence/movement policy currently in force
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicRules {
    /// Professor students plus towers, strict maximum wins
    #[default]
    Base,
    /// Towers do not count towards influence
    Centaur,
    /// The beneficiary gets a flat bonus on every island
    Knight { beneficiary: String },
    /// One color counts for nobody (unset until the color is chosen)
    Mushroom { excluded: Option<Color> },
    /// The beneficiary takes professors on ties
    Farmer { beneficiary: String },
    /// Mother nature may move further
    Postman,
}

impl DynamicRules {
    pub fn is_base(&self) -> bool {
        matches!(self, DynamicRules::Base)
    }

    /// Maximum mother-nature steps allowed by a played card
    pub fn max_movement(&self, card: &AssistantCard) -> u8 {
        match self {
            DynamicRules::Postman => card.movement + POSTMAN_EXTRA_MOVES,
            _ => card.movement,
        }
    }

    /// Influence of one player on an island
    pub fn influence(&self, game: &Game, island: &Island, nickname: &str) -> u32 {
        let excluded = match self {
            DynamicRules::Mushroom { excluded } => *excluded,
            _ => None,
        };

        let mut score: u32 = Color::ALL
            .into_iter()
            .filter(|color| Some(*color) != excluded)
            .filter(|color| game.professors.get(color).map(String::as_str) == Some(nickname))
            .map(|color| island.students.get(color))
            .sum();

        if !matches!(self, DynamicRules::Centaur) && island.owner.as_deref() == Some(nickname) {
            score += island.towers();
        }

        if let DynamicRules::Knight { beneficiary } = self {
            if beneficiary == nickname {
                score += KNIGHT_BONUS;
            }
        }

        score
    }

    /// Player with the strictly greatest influence on the island at
    /// `position`, or `None` on a tie or when nobody has any
    pub fn compute_island_influence(&self, game: &Game, position: usize) -> Option<String> {
        let island = game.islands.get(position)?;

        let scores: Vec<(&str, u32)> = game
            .players
            .iter()
            .map(|p| (p.nickname.as_str(), self.influence(game, island, &p.nickname)))
            .collect();

        let max = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        if max == 0 {
            return None;
        }

        let mut leaders = scores.iter().filter(|(_, s)| *s == max);
        match (leaders.next(), leaders.next()) {
            (Some((nickname, _)), None) => Some(nickname.to_string()),
            _ => None,
        }
    }

    /// Who should hold the professor of `color` given current halls.
    ///
    /// The incumbent keeps it while tied for the lead, unless the Farmer
    /// beneficiary is tied with them. Nobody holds it when the lead is shared
    /// by others or when no hall has a student of that color.
    pub fn professor_owner(&self, game: &Game, color: Color) -> Option<String> {
        let holder = game.professors.get(&color).cloned();
        let farmer = match self {
            DynamicRules::Farmer { beneficiary } => Some(beneficiary.as_str()),
            _ => None,
        };

        let max = game
            .players
            .iter()
            .map(|p| p.school.hall.get(color))
            .max()
            .unwrap_or(0);
        if max == 0 {
            return None;
        }

        let top: Vec<&str> = game
            .players
            .iter()
            .filter(|p| p.school.hall.get(color) == max)
            .map(|p| p.nickname.as_str())
            .collect();

        if let Some(beneficiary) = farmer {
            if top.contains(&beneficiary) {
                return Some(beneficiary.to_string());
            }
        }

        if let Some(h) = holder.as_deref() {
            if top.contains(&h) {
                return holder;
            }
        }

        // a holder who dropped out of a tied lead loses the professor
        match top.as_slice() {
            [only] => Some(only.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rules() {
        let two = TableRules::for_players(2).unwrap();
        assert_eq!((two.entry_size, two.towers, two.students_per_turn), (7, 8, 3));

        let three = TableRules::for_players(3).unwrap();
        assert_eq!((three.entry_size, three.towers, three.students_per_turn), (9, 6, 4));

        assert!(TableRules::for_players(1).is_none());
        assert!(TableRules::for_players(4).is_none());
    }

    #[test]
    fn test_professor_follows_the_lead() {
        let nicknames = vec!["Ale".into(), "Fede".into(), "Davide".into()];
        let mut game = Game::with_seed(nicknames, false, 1).unwrap();
        for player in &mut game.players {
            player.school.hall.set(Color::Red, 2);
        }
        game.professors.insert(Color::Red, "Ale".into());
        let owner = |game: &Game| DynamicRules::Base.professor_owner(game, Color::Red);

        assert_eq!(owner(&game).as_deref(), Some("Ale"));

        // Ale drops behind a two-way tie
        game.players[0].school.hall.set(Color::Red, 1);
        assert_eq!(owner(&game), None);

        game.players[1].school.hall.set(Color::Red, 3);
        assert_eq!(owner(&game).as_deref(), Some("Fede"));

        for player in &mut game.players {
            player.school.hall.set(Color::Red, 0);
        }
        assert_eq!(owner(&game), None);
    }

    #[test]
    fn test_postman_extends_movement() {
        let card = AssistantCard::new(3);
        assert_eq!(DynamicRules::Base.max_movement(&card), 2);
        assert_eq!(DynamicRules::Postman.max_movement(&card), 4);
    }
}
