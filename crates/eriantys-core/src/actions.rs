//! Player actions.
//!
//! Every action binds a nickname to one payload variant. Legality and effect
//! of each kind live in a single dispatch table, so every kind goes through
//! the same checks in the same order:
//!
//! 1. the nickname belongs to a player
//! 2. the player owns the round (or activated the card, for card actions)
//! 3. the game is in a state where this kind is legal
//! 4. kind-specific checks
//!
//! `perform` never mutates the game unless every check passed.

use crate::characters::Character;
use crate::error::GameError;
use crate::events::ModelEvent;
use crate::game::{Game, GameState};
use crate::player::MAGICIANS;
use crate::students::Color;
use serde::{Deserialize, Serialize};

/// Action kinds, as named on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ChooseMagician,
    PlayCard,
    MoveMotherNature,
    MoveStudentIsland,
    MoveStudentHall,
    ChooseCloud,
    ActivateCard,
    DeactivateCard,
    GrandmaBlock,
    HeraldChoose,
    JokerSwap,
    MinstrelSwap,
    MonkMove,
    MushroomChoose,
    PrincessMove,
    ThiefChoose,
}

/// Parameters of each action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ActionPayload {
    ChooseMagician { magician: u8 },
    PlayCard { value: u8 },
    MoveMotherNature { steps: usize },
    MoveStudentToIsland { color: Color, island: usize },
    MoveStudentToHall { color: Color },
    ChooseCloud { cloud: usize },
    ActivateCard { card: usize },
    DeactivateCard { card: usize },
    GrandmaBlock { island: usize },
    HeraldChoose { island: usize },
    /// Swap a student on the card with one in the entry
    JokerSwap { from_card: Color, from_entry: Color },
    /// Swap a student in the entry with one in the hall
    MinstrelSwap { from_entry: Color, from_hall: Color },
    MonkMove { color: Color, island: usize },
    MushroomChoose { color: Color },
    PrincessMove { color: Color },
    ThiefChoose { color: Color },
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::ChooseMagician { .. } => ActionKind::ChooseMagician,
            ActionPayload::PlayCard { .. } => ActionKind::PlayCard,
            ActionPayload::MoveMotherNature { .. } => ActionKind::MoveMotherNature,
            ActionPayload::MoveStudentToIsland { .. } => ActionKind::MoveStudentIsland,
            ActionPayload::MoveStudentToHall { .. } => ActionKind::MoveStudentHall,
            ActionPayload::ChooseCloud { .. } => ActionKind::ChooseCloud,
            ActionPayload::ActivateCard { .. } => ActionKind::ActivateCard,
            ActionPayload::DeactivateCard { .. } => ActionKind::DeactivateCard,
            ActionPayload::GrandmaBlock { .. } => ActionKind::GrandmaBlock,
            ActionPayload::HeraldChoose { .. } => ActionKind::HeraldChoose,
            ActionPayload::JokerSwap { .. } => ActionKind::JokerSwap,
            ActionPayload::MinstrelSwap { .. } => ActionKind::MinstrelSwap,
            ActionPayload::MonkMove { .. } => ActionKind::MonkMove,
            ActionPayload::MushroomChoose { .. } => ActionKind::MushroomChoose,
            ActionPayload::PrincessMove { .. } => ActionKind::PrincessMove,
            ActionPayload::ThiefChoose { .. } => ActionKind::ThiefChoose,
        }
    }
}

/// An intent submitted by a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub nickname: String,
    pub payload: ActionPayload,
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, GameError> {
    value.ok_or_else(|| GameError::InvalidMove(format!("missing parameter {name}")))
}

fn non_negative(value: Option<i64>, name: &str) -> Result<usize, GameError> {
    let value = required(value, name)?;
    usize::try_from(value)
        .map_err(|_| GameError::InvalidMove(format!("{name} must not be negative, got {value}")))
}

impl Action {
    pub fn new(nickname: impl Into<String>, payload: ActionPayload) -> Self {
        Self {
            nickname: nickname.into(),
            payload,
        }
    }

    /// Build an action from the generic wire parameters. No kind reads a
    /// second integer, so `int1` never reaches this point.
    pub fn from_params(
        nickname: impl Into<String>,
        kind: ActionKind,
        int0: Option<i64>,
        color0: Option<Color>,
        color1: Option<Color>,
    ) -> Result<Self, GameError> {
        let payload = match kind {
            ActionKind::ChooseMagician => {
                let magician = non_negative(int0, "int0")?;
                let magician = u8::try_from(magician)
                    .ok()
                    .filter(|m| *m < MAGICIANS)
                    .ok_or(GameError::InvalidIndex {
                        what: "magician",
                        index: magician as i64,
                        len: MAGICIANS as usize,
                    })?;
                ActionPayload::ChooseMagician { magician }
            }
            ActionKind::PlayCard => {
                let value = non_negative(int0, "int0")?;
                let value = u8::try_from(value).map_err(|_| GameError::InvalidIndex {
                    what: "assistant card",
                    index: value as i64,
                    len: 10,
                })?;
                ActionPayload::PlayCard { value }
            }
            ActionKind::MoveMotherNature => ActionPayload::MoveMotherNature {
                steps: non_negative(int0, "int0")?,
            },
            ActionKind::MoveStudentIsland => ActionPayload::MoveStudentToIsland {
                color: required(color0, "color0")?,
                island: non_negative(int0, "int0")?,
            },
            ActionKind::MoveStudentHall => ActionPayload::MoveStudentToHall {
                color: required(color0, "color0")?,
            },
            ActionKind::ChooseCloud => ActionPayload::ChooseCloud {
                cloud: non_negative(int0, "int0")?,
            },
            ActionKind::ActivateCard => ActionPayload::ActivateCard {
                card: non_negative(int0, "int0")?,
            },
            ActionKind::DeactivateCard => ActionPayload::DeactivateCard {
                card: non_negative(int0, "int0")?,
            },
            ActionKind::GrandmaBlock => ActionPayload::GrandmaBlock {
                island: non_negative(int0, "int0")?,
            },
            ActionKind::HeraldChoose => ActionPayload::HeraldChoose {
                island: non_negative(int0, "int0")?,
            },
            ActionKind::JokerSwap => ActionPayload::JokerSwap {
                from_card: required(color0, "color0")?,
                from_entry: required(color1, "color1")?,
            },
            ActionKind::MinstrelSwap => ActionPayload::MinstrelSwap {
                from_entry: required(color0, "color0")?,
                from_hall: required(color1, "color1")?,
            },
            ActionKind::MonkMove => ActionPayload::MonkMove {
                color: required(color0, "color0")?,
                island: non_negative(int0, "int0")?,
            },
            ActionKind::MushroomChoose => ActionPayload::MushroomChoose {
                color: required(color0, "color0")?,
            },
            ActionKind::PrincessMove => ActionPayload::PrincessMove {
                color: required(color0, "color0")?,
            },
            ActionKind::ThiefChoose => ActionPayload::ThiefChoose {
                color: required(color0, "color0")?,
            },
        };
        Ok(Self::new(nickname, payload))
    }

    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    fn handler(&self) -> &'static Handler {
        let handler = &HANDLERS[self.kind() as usize];
        debug_assert_eq!(handler.kind, self.kind());
        handler
    }

    /// Check whether the action is legal right now
    pub fn can_perform(&self, game: &Game) -> Result<(), GameError> {
        let handler = self.handler();

        if game.player(&self.nickname).is_none() {
            return Err(GameError::InvalidPlayer {
                nickname: self.nickname.clone(),
            });
        }

        match handler.issuer {
            Issuer::RoundOwner => {
                if !game.is_round_owner(&self.nickname) {
                    return Err(GameError::NotRoundOwner {
                        nickname: self.nickname.clone(),
                    });
                }
            }
            Issuer::Activator(character) => {
                let activator = game
                    .characters
                    .iter()
                    .find(|c| c.active && c.character == character)
                    .and_then(|c| c.activator.as_deref());
                if activator.is_some_and(|a| a != self.nickname) {
                    return Err(GameError::NotActivator {
                        nickname: self.nickname.clone(),
                    });
                }
            }
            Issuer::CardActivator => {
                if let ActionPayload::DeactivateCard { card } = self.payload {
                    let activator = game
                        .characters
                        .get(card)
                        .filter(|c| c.active)
                        .and_then(|c| c.activator.as_deref());
                    if activator.is_some_and(|a| a != self.nickname) {
                        return Err(GameError::NotActivator {
                            nickname: self.nickname.clone(),
                        });
                    }
                }
            }
        }

        if !handler.states.is_empty() && !handler.states.contains(&game.state) {
            return Err(GameError::WrongState { state: game.state });
        }

        (handler.check)(game, self)
    }

    /// Check the action and apply it, returning the events it produced
    pub fn perform(&self, game: &mut Game) -> Result<Vec<ModelEvent>, GameError> {
        self.can_perform(game)?;
        (self.handler().apply)(game, self);
        Ok(game.drain_events())
    }
}

// ==================== Dispatch table ====================

/// Who may issue an action kind
#[derive(Debug, Clone, Copy)]
enum Issuer {
    RoundOwner,
    /// Whoever activated the (active) card of this character
    Activator(Character),
    /// Whoever activated the card named in the payload
    CardActivator,
}

struct Handler {
    kind: ActionKind,
    issuer: Issuer,
    /// States this kind is legal in; empty means any
    states: &'static [GameState],
    check: fn(&Game, &Action) -> Result<(), GameError>,
    apply: fn(&mut Game, &Action),
}

const ACTION_STATES: &[GameState] = &[GameState::ActionMoveStudents, GameState::ActionMoveMother];

static HANDLERS: [Handler; 16] = [
    Handler {
        kind: ActionKind::ChooseMagician,
        issuer: Issuer::RoundOwner,
        states: &[GameState::Setup],
        check: check_choose_magician,
        apply: apply_choose_magician,
    },
    Handler {
        kind: ActionKind::PlayCard,
        issuer: Issuer::RoundOwner,
        states: &[GameState::PlanningChooseCard],
        check: check_play_card,
        apply: apply_play_card,
    },
    Handler {
        kind: ActionKind::MoveMotherNature,
        issuer: Issuer::RoundOwner,
        states: &[GameState::ActionMoveMother],
        check: check_move_mother_nature,
        apply: apply_move_mother_nature,
    },
    Handler {
        kind: ActionKind::MoveStudentIsland,
        issuer: Issuer::RoundOwner,
        states: &[GameState::ActionMoveStudents],
        check: check_move_student_island,
        apply: apply_move_student_island,
    },
    Handler {
        kind: ActionKind::MoveStudentHall,
        issuer: Issuer::RoundOwner,
        states: &[GameState::ActionMoveStudents],
        check: check_move_student_hall,
        apply: apply_move_student_hall,
    },
    Handler {
        kind: ActionKind::ChooseCloud,
        issuer: Issuer::RoundOwner,
        states: &[GameState::ActionChooseCloud],
        check: check_choose_cloud,
        apply: apply_choose_cloud,
    },
    Handler {
        kind: ActionKind::ActivateCard,
        issuer: Issuer::RoundOwner,
        states: ACTION_STATES,
        check: check_activate_card,
        apply: apply_activate_card,
    },
    Handler {
        kind: ActionKind::DeactivateCard,
        issuer: Issuer::CardActivator,
        states: &[],
        check: check_deactivate_card,
        apply: apply_deactivate_card,
    },
    Handler {
        kind: ActionKind::GrandmaBlock,
        issuer: Issuer::Activator(Character::Grandma),
        states: &[GameState::GrandmaBlockIsland],
        check: check_grandma_block,
        apply: apply_grandma_block,
    },
    Handler {
        kind: ActionKind::HeraldChoose,
        issuer: Issuer::Activator(Character::Herald),
        states: &[GameState::HeraldChooseIsland],
        check: check_herald_choose,
        apply: apply_herald_choose,
    },
    Handler {
        kind: ActionKind::JokerSwap,
        issuer: Issuer::Activator(Character::Joker),
        states: &[GameState::JokerSwapStudents],
        check: check_joker_swap,
        apply: apply_joker_swap,
    },
    Handler {
        kind: ActionKind::MinstrelSwap,
        issuer: Issuer::Activator(Character::Minstrel),
        states: &[GameState::MinstrelSwapStudents],
        check: check_minstrel_swap,
        apply: apply_minstrel_swap,
    },
    Handler {
        kind: ActionKind::MonkMove,
        issuer: Issuer::Activator(Character::Monk),
        states: &[GameState::MonkMoveToIsland],
        check: check_monk_move,
        apply: apply_monk_move,
    },
    Handler {
        kind: ActionKind::MushroomChoose,
        issuer: Issuer::Activator(Character::Mushroom),
        states: &[GameState::MushroomChooseColor],
        check: check_mushroom_choose,
        apply: apply_mushroom_choose,
    },
    Handler {
        kind: ActionKind::PrincessMove,
        issuer: Issuer::Activator(Character::Princess),
        states: &[GameState::PrincessMoveToHall],
        check: check_princess_move,
        apply: apply_princess_move,
    },
    Handler {
        kind: ActionKind::ThiefChoose,
        issuer: Issuer::Activator(Character::Thief),
        states: &[GameState::ThiefChooseColor],
        check: check_thief_choose,
        apply: apply_thief_choose,
    },
];

// ==================== Shared checks ====================

fn malformed(action: &Action) -> GameError {
    GameError::InvalidMove(format!("unexpected payload for {:?}", action.kind()))
}

fn check_island(game: &Game, island: usize) -> Result<(), GameError> {
    if game.islands.is_feasible_index(island) {
        Ok(())
    } else {
        Err(GameError::InvalidIndex {
            what: "island",
            index: island as i64,
            len: game.islands.len(),
        })
    }
}

fn check_entry(game: &Game, nickname: &str, color: Color) -> Result<(), GameError> {
    match game.player(nickname) {
        Some(player) if player.school.entry.contains(color) => Ok(()),
        _ => Err(GameError::MissingStudent { color }),
    }
}

fn check_hall_room(game: &Game, nickname: &str, color: Color) -> Result<(), GameError> {
    match game.player(nickname) {
        Some(player) if player.school.hall_has_room(color) => Ok(()),
        _ => Err(GameError::HallFull { color }),
    }
}

/// Index of the active card of `character`
fn active_card(game: &Game, character: Character) -> Result<usize, GameError> {
    game.active_character_of(character)
        .ok_or(GameError::CardNotActive)
}

fn check_on_card(game: &Game, character: Character, color: Color) -> Result<usize, GameError> {
    let index = active_card(game, character)?;
    if game.characters[index].students.contains(color) {
        Ok(index)
    } else {
        Err(GameError::MissingStudent { color })
    }
}

// ==================== Setup and planning ====================

fn check_choose_magician(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::ChooseMagician { magician } = action.payload else {
        return Err(malformed(action));
    };
    if magician >= MAGICIANS {
        return Err(GameError::InvalidIndex {
            what: "magician",
            index: magician as i64,
            len: MAGICIANS as usize,
        });
    }
    if game.players.iter().any(|p| p.magician == Some(magician)) {
        return Err(GameError::MagicianTaken { magician });
    }
    Ok(())
}

fn apply_choose_magician(game: &mut Game, action: &Action) {
    let ActionPayload::ChooseMagician { magician } = action.payload else {
        return;
    };
    if let Some(player) = game.player_mut(&action.nickname) {
        player.magician = Some(magician);
    }
    game.after_magician_chosen();
}

fn check_play_card(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::PlayCard { value } = action.payload else {
        return Err(malformed(action));
    };
    let Some(player) = game.player(&action.nickname) else {
        return Err(GameError::InvalidPlayer {
            nickname: action.nickname.clone(),
        });
    };
    if !player.has_card(value) {
        return Err(GameError::CardNotInHand { value });
    }

    let taken: Vec<u8> = game
        .players
        .iter()
        .filter(|p| p.nickname != action.nickname)
        .filter_map(|p| p.played_card.map(|c| c.value))
        .collect();
    // A duplicate is only allowed when the hand holds nothing else
    let has_alternative = player.hand.iter().any(|c| !taken.contains(&c.value));
    if taken.contains(&value) && has_alternative {
        return Err(GameError::CardAlreadyPlayed { value });
    }
    Ok(())
}

fn apply_play_card(game: &mut Game, action: &Action) {
    let ActionPayload::PlayCard { value } = action.payload else {
        return;
    };
    if let Some(player) = game.player_mut(&action.nickname) {
        player.play_card(value);
    }
    game.notify_hand(&action.nickname);
    game.after_card_played();
}

// ==================== Action phase ====================

fn check_move_student_hall(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::MoveStudentToHall { color } = action.payload else {
        return Err(malformed(action));
    };
    check_entry(game, &action.nickname, color)?;
    check_hall_room(game, &action.nickname, color)
}

fn apply_move_student_hall(game: &mut Game, action: &Action) {
    let ActionPayload::MoveStudentToHall { color } = action.payload else {
        return;
    };
    if let Some(player) = game.player_mut(&action.nickname) {
        player.school.entry.remove(color);
    }
    game.add_to_hall(&action.nickname, color);
    game.after_student_moved();
}

fn check_move_student_island(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::MoveStudentToIsland { color, island } = action.payload else {
        return Err(malformed(action));
    };
    check_island(game, island)?;
    check_entry(game, &action.nickname, color)
}

fn apply_move_student_island(game: &mut Game, action: &Action) {
    let ActionPayload::MoveStudentToIsland { color, island } = action.payload else {
        return;
    };
    if let Some(player) = game.player_mut(&action.nickname) {
        player.school.entry.remove(color);
    }
    if let Some(island) = game.islands.get_mut(island) {
        island.students.add(color, 1);
    }
    game.notify_school(&action.nickname);
    game.notify_island(island);
    game.after_student_moved();
}

fn check_move_mother_nature(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::MoveMotherNature { steps } = action.payload else {
        return Err(malformed(action));
    };
    let max = game
        .player(&action.nickname)
        .and_then(|p| p.played_card.as_ref())
        .map(|card| game.rules.max_movement(card) as usize)
        .unwrap_or(0);
    if steps == 0 || steps > max {
        return Err(GameError::InvalidMovement { steps, max });
    }
    Ok(())
}

fn apply_move_mother_nature(game: &mut Game, action: &Action) {
    let ActionPayload::MoveMotherNature { steps } = action.payload else {
        return;
    };
    game.mother_nature = game
        .islands
        .correct_index(steps as isize, game.mother_nature);
    game.notify_mother_nature();

    let position = game.mother_nature;
    game.resolve_island(position);
    if game.check_immediate_end() {
        return;
    }
    game.after_mother_nature_moved();
}

fn check_choose_cloud(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::ChooseCloud { cloud } = action.payload else {
        return Err(malformed(action));
    };
    match game.clouds.get(cloud) {
        None => Err(GameError::InvalidIndex {
            what: "cloud",
            index: cloud as i64,
            len: game.clouds.len(),
        }),
        Some(c) if c.students.is_empty() => Err(GameError::EmptyCloud { index: cloud }),
        Some(_) => Ok(()),
    }
}

fn apply_choose_cloud(game: &mut Game, action: &Action) {
    let ActionPayload::ChooseCloud { cloud } = action.payload else {
        return;
    };
    let students = match game.clouds.get_mut(cloud) {
        Some(c) => c.students.take_all(),
        None => return,
    };
    if let Some(player) = game.player_mut(&action.nickname) {
        player.school.entry.add_set(&students);
    }
    game.notify_school(&action.nickname);
    game.notify_clouds();
    game.end_turn();
}

// ==================== Character cards ====================

fn check_activate_card(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::ActivateCard { card } = action.payload else {
        return Err(malformed(action));
    };
    game.check_activation(&action.nickname, card)
}

fn apply_activate_card(game: &mut Game, action: &Action) {
    let ActionPayload::ActivateCard { card } = action.payload else {
        return;
    };
    game.activate_character(&action.nickname, card);
}

fn check_deactivate_card(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::DeactivateCard { card } = action.payload else {
        return Err(malformed(action));
    };
    if game.is_finished() {
        return Err(GameError::WrongState { state: game.state });
    }
    match game.characters.get(card) {
        None => Err(GameError::InvalidIndex {
            what: "character card",
            index: card as i64,
            len: game.characters.len(),
        }),
        Some(c) if !c.active => Err(GameError::CardNotActive),
        Some(_) => Ok(()),
    }
}

fn apply_deactivate_card(game: &mut Game, action: &Action) {
    let ActionPayload::DeactivateCard { card } = action.payload else {
        return;
    };
    game.deactivate_character(card);
}

fn check_grandma_block(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::GrandmaBlock { island } = action.payload else {
        return Err(malformed(action));
    };
    let index = active_card(game, Character::Grandma)?;
    check_island(game, island)?;
    if game.characters[index].no_entry_tiles == 0 {
        return Err(GameError::NoEntryTilesLeft);
    }
    Ok(())
}

fn apply_grandma_block(game: &mut Game, action: &Action) {
    let ActionPayload::GrandmaBlock { island } = action.payload else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Grandma) else {
        return;
    };
    game.characters[index].no_entry_tiles -= 1;
    if let Some(island) = game.islands.get_mut(island) {
        island.no_entry += 1;
    }
    game.notify_island(island);
    game.deactivate_character(index);
}

fn check_herald_choose(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::HeraldChoose { island } = action.payload else {
        return Err(malformed(action));
    };
    active_card(game, Character::Herald)?;
    check_island(game, island)
}

fn apply_herald_choose(game: &mut Game, action: &Action) {
    let ActionPayload::HeraldChoose { island } = action.payload else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Herald) else {
        return;
    };
    game.resolve_island(island);
    game.check_immediate_end();
    game.deactivate_character(index);
}

fn check_joker_swap(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::JokerSwap {
        from_card,
        from_entry,
    } = action.payload
    else {
        return Err(malformed(action));
    };
    check_on_card(game, Character::Joker, from_card)?;
    check_entry(game, &action.nickname, from_entry)
}

fn apply_joker_swap(game: &mut Game, action: &Action) {
    let ActionPayload::JokerSwap {
        from_card,
        from_entry,
    } = action.payload
    else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Joker) else {
        return;
    };

    let card = &mut game.characters[index];
    card.students.remove(from_card);
    card.students.add(from_entry, 1);
    card.swaps_left = card.swaps_left.saturating_sub(1);
    let exhausted = card.swaps_left == 0;

    if let Some(player) = game.player_mut(&action.nickname) {
        player.school.entry.remove(from_entry);
        player.school.entry.add(from_card, 1);
    }
    game.notify_school(&action.nickname);
    game.notify_characters();

    if exhausted {
        game.deactivate_character(index);
    }
}

fn check_minstrel_swap(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::MinstrelSwap {
        from_entry,
        from_hall,
    } = action.payload
    else {
        return Err(malformed(action));
    };
    active_card(game, Character::Minstrel)?;
    if from_entry == from_hall {
        return Err(GameError::SameColorSwap { color: from_entry });
    }
    check_entry(game, &action.nickname, from_entry)?;
    let in_hall = game
        .player(&action.nickname)
        .is_some_and(|p| p.school.hall.contains(from_hall));
    if !in_hall {
        return Err(GameError::MissingStudent { color: from_hall });
    }
    check_hall_room(game, &action.nickname, from_entry)
}

fn apply_minstrel_swap(game: &mut Game, action: &Action) {
    let ActionPayload::MinstrelSwap {
        from_entry,
        from_hall,
    } = action.payload
    else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Minstrel) else {
        return;
    };

    if let Some(player) = game.player_mut(&action.nickname) {
        player.school.hall.remove(from_hall);
        player.school.entry.add(from_hall, 1);
        player.school.entry.remove(from_entry);
    }
    game.add_to_hall(&action.nickname, from_entry);
    game.update_professor(from_hall);

    let card = &mut game.characters[index];
    card.swaps_left = card.swaps_left.saturating_sub(1);
    let exhausted = card.swaps_left == 0;
    game.notify_characters();

    if exhausted {
        game.deactivate_character(index);
    }
}

fn check_monk_move(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::MonkMove { color, island } = action.payload else {
        return Err(malformed(action));
    };
    check_on_card(game, Character::Monk, color)?;
    check_island(game, island)
}

fn apply_monk_move(game: &mut Game, action: &Action) {
    let ActionPayload::MonkMove { color, island } = action.payload else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Monk) else {
        return;
    };
    game.characters[index].students.remove(color);
    if let Some(island) = game.islands.get_mut(island) {
        island.students.add(color, 1);
    }
    game.refill_character(index);
    game.notify_island(island);
    game.deactivate_character(index);
}

fn check_mushroom_choose(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::MushroomChoose { .. } = action.payload else {
        return Err(malformed(action));
    };
    active_card(game, Character::Mushroom).map(|_| ())
}

fn apply_mushroom_choose(game: &mut Game, action: &Action) {
    let ActionPayload::MushroomChoose { color } = action.payload else {
        return;
    };
    if let Some(index) = game.active_character_of(Character::Mushroom) {
        game.choose_mushroom_color(index, color);
    }
}

fn check_princess_move(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::PrincessMove { color } = action.payload else {
        return Err(malformed(action));
    };
    check_on_card(game, Character::Princess, color)?;
    check_hall_room(game, &action.nickname, color)
}

fn apply_princess_move(game: &mut Game, action: &Action) {
    let ActionPayload::PrincessMove { color } = action.payload else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Princess) else {
        return;
    };
    game.characters[index].students.remove(color);
    game.add_to_hall(&action.nickname, color);
    game.refill_character(index);
    game.deactivate_character(index);
}

fn check_thief_choose(game: &Game, action: &Action) -> Result<(), GameError> {
    let ActionPayload::ThiefChoose { .. } = action.payload else {
        return Err(malformed(action));
    };
    active_card(game, Character::Thief).map(|_| ())
}

/// Students of the chosen color each player returns to the bag
const THIEF_TAKES: u32 = 3;

fn apply_thief_choose(game: &mut Game, action: &Action) {
    let ActionPayload::ThiefChoose { color } = action.payload else {
        return;
    };
    let Some(index) = game.active_character_of(Character::Thief) else {
        return;
    };

    let nicknames: Vec<String> = game.players.iter().map(|p| p.nickname.clone()).collect();
    for nickname in &nicknames {
        let removed = game
            .player_mut(nickname)
            .map(|p| p.school.hall.remove_up_to(color, THIEF_TAKES))
            .unwrap_or(0);
        if removed > 0 {
            game.bag.put_back(color, removed);
            game.notify_school(nickname);
        }
    }
    game.update_professor(color);
    game.deactivate_character(index);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table_matches_kinds() {
        for (index, handler) in HANDLERS.iter().enumerate() {
            assert_eq!(handler.kind as usize, index, "{:?}", handler.kind);
        }
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&ActionKind::MoveStudentIsland).unwrap();
        assert_eq!(json, "\"MOVE_STUDENT_ISLAND\"");
        let kind: ActionKind = serde_json::from_str("\"CHOOSE_MAGICIAN\"").unwrap();
        assert_eq!(kind, ActionKind::ChooseMagician);
    }

    #[test]
    fn test_from_params_builds_payload() {
        let action = Action::from_params(
            "Ale",
            ActionKind::MonkMove,
            Some(4),
            Some(Color::Pink),
            None,
        )
        .unwrap();
        assert_eq!(
            action.payload,
            ActionPayload::MonkMove {
                color: Color::Pink,
                island: 4
            }
        );
        assert_eq!(action.kind(), ActionKind::MonkMove);
    }

    #[test]
    fn test_from_params_rejects_missing_and_negative() {
        let missing =
            Action::from_params("Ale", ActionKind::MoveStudentHall, None, None, None);
        assert!(matches!(missing, Err(GameError::InvalidMove(_))));

        let negative =
            Action::from_params("Ale", ActionKind::ChooseCloud, Some(-1), None, None);
        assert!(matches!(negative, Err(GameError::InvalidMove(_))));

        let magician =
            Action::from_params("Ale", ActionKind::ChooseMagician, Some(4), None, None);
        assert!(matches!(
            magician,
            Err(GameError::InvalidIndex {
                what: "magician",
                ..
            })
        ));
    }
}
