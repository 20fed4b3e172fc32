//! Core game state.
//!
//! This module contains the `Game` aggregate, the `GameState` phase value and
//! the mutation helpers shared by every action. Each helper appends the model
//! events describing what it changed, so the caller only has to drain them.

use crate::actions::Action;
use crate::characters::{Character, CharacterCard};
use crate::error::GameError;
use crate::events::ModelEvent;
use crate::islands::{IslandContainer, INITIAL_ISLANDS};
use crate::player::{Player, School, TowerColor};
use crate::round::RoundTracker;
use crate::rules::{DynamicRules, TableRules, INITIAL_BANK};
use crate::students::{Bag, Color, StudentSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Number of character cards in play in an expert match
pub const CHARACTERS_IN_PLAY: usize = 3;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Players choose their magician
    Setup,
    /// Players play an assistant card
    PlanningChooseCard,
    /// Round owner moves students out of the entry
    ActionMoveStudents,
    /// Round owner moves mother nature
    ActionMoveMother,
    /// Round owner takes a cloud
    ActionChooseCloud,

    // ==================== Character interactions ====================
    GrandmaBlockIsland,
    HeraldChooseIsland,
    JokerSwapStudents,
    MinstrelSwapStudents,
    MonkMoveToIsland,
    MushroomChooseColor,
    PrincessMoveToHall,
    ThiefChooseColor,

    /// Game is over
    GameEnded,
}

/// A cloud students are collected on between rounds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloud {
    pub students: StudentSet,
}

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

/// The complete state of one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Players in seating order
    pub players: Vec<Player>,
    pub islands: IslandContainer,
    pub clouds: Vec<Cloud>,
    /// Ring position of mother nature
    pub mother_nature: usize,
    pub bag: Bag,
    /// Professor color -> nickname of the holder
    pub professors: BTreeMap<Color, String>,
    pub expert_mode: bool,
    /// Coins in the shared bank
    pub bank: u32,
    /// Character cards in play (empty in normal mode)
    pub characters: Vec<CharacterCard>,
    /// Policy currently in force
    pub rules: DynamicRules,
    pub table: TableRules,
    pub state: GameState,
    pub round_owner: Option<String>,
    pub round: RoundTracker,
    /// Winner once the game has ended (`None` on a draw)
    pub winner: Option<String>,
    /// Events produced since the last drain
    #[serde(skip)]
    events: Vec<ModelEvent>,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

impl Game {
    /// Create a new game with a random seed
    pub fn new(nicknames: Vec<String>, expert_mode: bool) -> Result<Self, GameError> {
        Self::with_seed(nicknames, expert_mode, rand::thread_rng().gen())
    }

    /// Create a new game; the same seed always produces the same setup
    pub fn with_seed(
        nicknames: Vec<String>,
        expert_mode: bool,
        seed: u64,
    ) -> Result<Self, GameError> {
        let table = TableRules::for_players(nicknames.len())
            .ok_or(GameError::InvalidPlayerCount(nicknames.len()))?;

        let mut seen = HashSet::new();
        for nickname in &nicknames {
            if !seen.insert(nickname.as_str()) {
                return Err(GameError::DuplicateNickname(nickname.clone()));
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mother_nature = rng.gen_range(0..INITIAL_ISLANDS);
        let opposite = (mother_nature + INITIAL_ISLANDS / 2) % INITIAL_ISLANDS;

        // Seed every island but mother nature's and the opposite one
        let mut bag = Bag::seed();
        let mut islands = IslandContainer::new(INITIAL_ISLANDS);
        for position in 0..INITIAL_ISLANDS {
            if position == mother_nature || position == opposite {
                continue;
            }
            if let (Some(color), Some(island)) = (bag.draw(&mut rng), islands.get_mut(position)) {
                island.students.add(color, 1);
            }
        }
        bag.fill_remaining();

        let mut players: Vec<Player> = nicknames
            .into_iter()
            .enumerate()
            .map(|(seat, nickname)| {
                let entry = bag.draw_many(table.entry_size, &mut rng);
                let school = School::new(table.towers, TowerColor::for_seat(seat), entry);
                Player::new(nickname, seat, school)
            })
            .collect();

        let clouds = (0..players.len())
            .map(|_| Cloud {
                students: bag.draw_many(table.students_per_turn, &mut rng),
            })
            .collect();

        let mut characters = Vec::new();
        let mut bank = 0;
        if expert_mode {
            let mut catalogue = Character::ALL.to_vec();
            catalogue.shuffle(&mut rng);
            for character in catalogue.into_iter().take(CHARACTERS_IN_PLAY) {
                let mut card = CharacterCard::new(character);
                card.init(&mut bag, &mut rng);
                characters.push(card);
            }

            bank = INITIAL_BANK;
            for player in &mut players {
                player.coins = 1;
                bank -= 1;
            }
        }

        let round = RoundTracker::new(players.iter().map(|p| p.nickname.clone()).collect());
        let round_owner = players.first().map(|p| p.nickname.clone());

        Ok(Self {
            players,
            islands,
            clouds,
            mother_nature,
            bag,
            professors: BTreeMap::new(),
            expert_mode,
            bank,
            characters,
            rules: DynamicRules::Base,
            table,
            state: GameState::Setup,
            round_owner,
            round,
            winner: None,
            events: Vec::new(),
            rng,
        })
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by nickname
    pub fn player(&self, nickname: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.nickname == nickname)
    }

    pub(crate) fn player_mut(&mut self, nickname: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.nickname == nickname)
    }

    /// Whether `nickname` currently owns the round
    pub fn is_round_owner(&self, nickname: &str) -> bool {
        self.round_owner.as_deref() == Some(nickname)
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.state == GameState::GameEnded
    }

    /// Index of the active character card, if any
    pub fn active_character(&self) -> Option<usize> {
        self.characters.iter().position(|c| c.active)
    }

    /// Index of the card of the given kind, if it is in play and active
    pub fn active_character_of(&self, character: Character) -> Option<usize> {
        self.characters
            .iter()
            .position(|c| c.active && c.character == character)
    }

    /// Validate and apply an action, returning the events it produced
    pub fn apply_action(&mut self, action: &Action) -> Result<Vec<ModelEvent>, GameError> {
        action.perform(self)
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Full observable state as JSON, as sent on resync
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    // ==================== State machine ====================

    /// Move to a new phase. This is the only place `state` changes.
    pub(crate) fn transition(&mut self, to: GameState) {
        if self.state == to {
            return;
        }
        self.state = to;
        self.events.push(ModelEvent::GameState { state: to });
    }

    pub(crate) fn set_round_owner(&mut self, nickname: String) {
        if self.round_owner.as_deref() == Some(nickname.as_str()) {
            return;
        }
        self.round_owner = Some(nickname.clone());
        self.events.push(ModelEvent::RoundOwner { nickname });
    }

    // ==================== Notifications ====================

    pub(crate) fn notify_school(&mut self, nickname: &str) {
        if let Some(player) = self.player(nickname) {
            let event = ModelEvent::School {
                nickname: player.nickname.clone(),
                school: player.school.clone(),
            };
            self.events.push(event);
        }
    }

    pub(crate) fn notify_hand(&mut self, nickname: &str) {
        if let Some(player) = self.player(nickname) {
            let event = ModelEvent::Hand {
                nickname: player.nickname.clone(),
                hand: player.hand.clone(),
                played: player.played_card,
            };
            self.events.push(event);
        }
    }

    pub(crate) fn notify_coins(&mut self, nickname: &str) {
        if let Some(player) = self.player(nickname) {
            let event = ModelEvent::Coins {
                nickname: player.nickname.clone(),
                coins: player.coins,
                bank: self.bank,
            };
            self.events.push(event);
        }
    }

    pub(crate) fn notify_clouds(&mut self) {
        self.events.push(ModelEvent::Clouds {
            clouds: self.clouds.clone(),
        });
    }

    pub(crate) fn notify_island(&mut self, position: usize) {
        if let Some(island) = self.islands.get(position) {
            let event = ModelEvent::Island {
                position,
                island: island.clone(),
            };
            self.events.push(event);
        }
    }

    pub(crate) fn notify_professors(&mut self) {
        self.events.push(ModelEvent::Professors {
            professors: self.professors.clone(),
        });
    }

    pub(crate) fn notify_characters(&mut self) {
        self.events.push(ModelEvent::Characters {
            cards: self.characters.clone(),
        });
    }

    pub(crate) fn notify_mother_nature(&mut self) {
        self.events.push(ModelEvent::MotherNature {
            position: self.mother_nature,
        });
    }

    pub(crate) fn notify_game_over(&mut self) {
        self.events.push(ModelEvent::GameOver {
            winner: self.winner.clone(),
        });
    }

    // ==================== Shared mutations ====================

    /// Seat a student in a hall, paying out a coin on coin spaces and
    /// re-evaluating the professor of that color
    pub(crate) fn add_to_hall(&mut self, nickname: &str, color: Color) {
        let can_pay = self.expert_mode && self.bank > 0;
        let mut paid = false;
        if let Some(player) = self.player_mut(nickname) {
            let coin_space = player.school.add_to_hall(color);
            if can_pay && coin_space {
                player.coins += 1;
                paid = true;
            }
        }
        if paid {
            self.bank -= 1;
            self.notify_coins(nickname);
        }
        self.update_professor(color);
        self.notify_school(nickname);
    }

    /// Re-evaluate who holds the professor of `color`
    pub(crate) fn update_professor(&mut self, color: Color) {
        let owner = self.rules.professor_owner(self, color);
        if owner.as_ref() == self.professors.get(&color) {
            return;
        }
        match owner {
            Some(nickname) => self.professors.insert(color, nickname),
            None => self.professors.remove(&color),
        };
        self.notify_professors();
    }

    pub(crate) fn update_all_professors(&mut self) {
        for color in Color::ALL {
            self.update_professor(color);
        }
    }

    /// Draw up to `count` students from the bag
    pub(crate) fn draw_students(&mut self, count: u32) -> StudentSet {
        self.bag.draw_many(count, &mut self.rng)
    }

    /// Resolve influence on the island at `position` and merge it with
    /// eligible neighbours.
    ///
    /// A no-entry tile on the island is consumed instead and influence is not
    /// computed. Mother nature is kept on the node that contains her island.
    pub(crate) fn resolve_island(&mut self, position: usize) {
        let blocked = match self.islands.get_mut(position) {
            Some(island) if island.no_entry > 0 => {
                island.no_entry -= 1;
                true
            }
            Some(_) => false,
            None => return,
        };
        if blocked {
            if let Some(card) = self
                .characters
                .iter_mut()
                .find(|c| c.character == Character::Grandma)
            {
                card.no_entry_tiles += 1;
            }
            self.notify_island(position);
            self.notify_characters();
            return;
        }

        let mother_handle = self.islands.handle_at(self.mother_nature);

        if let Some(new_owner) = self.rules.compute_island_influence(self, position) {
            let previous = self.islands.get(position).and_then(|i| i.owner.clone());
            if previous.as_deref() != Some(new_owner.as_str()) {
                if let Some(island) = self.islands.get_mut(position) {
                    island.owner = Some(new_owner.clone());
                }
                if let Some(player) = self.player_mut(&new_owner) {
                    player.school.take_tower();
                }
                self.notify_school(&new_owner);
                if let Some(previous) = previous {
                    if let Some(player) = self.player_mut(&previous) {
                        player.school.return_tower();
                    }
                    self.notify_school(&previous);
                }
                self.notify_island(position);
            }
        }

        let (merged_at, merges) = self.islands.merge_neighbours(position);
        for merge in &merges {
            self.events.push(ModelEvent::IslandsMerged {
                survivor: merge.survivor,
                absorbed: merge.absorbed,
            });
        }
        if !merges.is_empty() {
            self.notify_island(merged_at);
        }

        if let Some(position) = mother_handle.and_then(|h| self.islands.position_of(h)) {
            if position != self.mother_nature {
                self.mother_nature = position;
                self.notify_mother_nature();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        ["Ale", "Fede", "Davide"]
            .iter()
            .take(n)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = Game::with_seed(names(3), false, 1).unwrap();
        assert_eq!(game.state, GameState::Setup);
        assert_eq!(game.round_owner.as_deref(), Some("Ale"));
        assert!(game.characters.is_empty());
        assert_eq!(game.bank, 0);
    }

    #[test]
    fn test_setup_seeds_ten_islands() {
        let game = Game::with_seed(names(2), false, 42).unwrap();
        let opposite = (game.mother_nature + 6) % 12;

        for (position, island) in game.islands.iter().enumerate() {
            let expected = if position == game.mother_nature || position == opposite {
                0
            } else {
                1
            };
            assert_eq!(island.students.total(), expected, "island {position}");
        }
    }

    #[test]
    fn test_setup_fills_schools_and_clouds() {
        let game = Game::with_seed(names(3), false, 3).unwrap();
        for player in &game.players {
            assert_eq!(player.school.entry.total(), 9);
            assert_eq!(player.school.towers, 6);
            assert_eq!(player.hand.len(), 10);
        }
        assert_eq!(game.clouds.len(), 3);
        assert!(game.clouds.iter().all(|c| c.students.total() == 4));
        // 130 - 10 on islands - 27 in entries - 12 on clouds
        assert_eq!(game.bag.len(), 81);
    }

    #[test]
    fn test_expert_setup() {
        let game = Game::with_seed(names(2), true, 9).unwrap();
        assert_eq!(game.characters.len(), CHARACTERS_IN_PLAY);
        assert_eq!(game.bank, 18);
        assert!(game.players.iter().all(|p| p.coins == 1));

        let kinds: HashSet<_> = game.characters.iter().map(|c| c.character).collect();
        assert_eq!(kinds.len(), CHARACTERS_IN_PLAY);
    }

    #[test]
    fn test_invalid_player_counts() {
        assert_eq!(
            Game::with_seed(names(1), false, 0).unwrap_err(),
            GameError::InvalidPlayerCount(1)
        );
        assert_eq!(
            Game::with_seed(vec!["Ale".into(), "Ale".into()], false, 0).unwrap_err(),
            GameError::DuplicateNickname("Ale".into())
        );
    }

    #[test]
    fn test_same_seed_same_setup() {
        let a = Game::with_seed(names(3), true, 77).unwrap();
        let b = Game::with_seed(names(3), true, 77).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_transition_emits_once() {
        let mut game = Game::with_seed(names(2), false, 5).unwrap();
        game.transition(GameState::PlanningChooseCard);
        game.transition(GameState::PlanningChooseCard);

        assert_eq!(
            game.drain_events(),
            vec![ModelEvent::GameState {
                state: GameState::PlanningChooseCard
            }]
        );
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_add_to_hall_pays_coin_and_takes_professor() {
        let mut game = Game::with_seed(names(2), true, 5).unwrap();
        let bank = game.bank;
        for _ in 0..3 {
            game.add_to_hall("Fede", Color::Blue);
        }

        let fede = game.player("Fede").unwrap();
        assert_eq!(fede.coins, 2);
        assert_eq!(game.bank, bank - 1);
        assert_eq!(game.professors.get(&Color::Blue).map(String::as_str), Some("Fede"));
    }
}
