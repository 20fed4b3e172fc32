//! Legality checks of the base actions.
//!
//! Each action kind is tried with an unknown player, a player who does not own
//! the round, in the wrong state and with bad parameters.

use eriantys_core::*;
use pretty_assertions::assert_eq;

fn new_game() -> Game {
    Game::with_seed(vec!["Ale".into(), "Fede".into(), "Davide".into()], false, 13).unwrap()
}

fn act(game: &mut Game, nickname: &str, payload: ActionPayload) -> Result<Vec<ModelEvent>, GameError> {
    game.apply_action(&Action::new(nickname, payload))
}

fn rejected(game: &mut Game, nickname: &str, payload: ActionPayload) -> GameError {
    let before = game.snapshot();
    let err = act(game, nickname, payload).unwrap_err();
    assert_eq!(game.snapshot(), before);
    err
}

fn in_planning() -> Game {
    let mut game = new_game();
    for magician in 0..3 {
        let owner = game.round_owner.clone().unwrap();
        act(&mut game, &owner, ActionPayload::ChooseMagician { magician }).unwrap();
    }
    game
}

fn in_action_phase() -> Game {
    let mut game = in_planning();
    act(&mut game, "Ale", ActionPayload::PlayCard { value: 4 }).unwrap();
    act(&mut game, "Fede", ActionPayload::PlayCard { value: 6 }).unwrap();
    act(&mut game, "Davide", ActionPayload::PlayCard { value: 8 }).unwrap();
    game
}

fn missing_color(game: &Game, nickname: &str) -> Option<Color> {
    let entry = &game.player(nickname).unwrap().school.entry;
    Color::ALL.into_iter().find(|c| !entry.contains(*c))
}

#[test]
fn test_choose_magician() {
    let mut game = new_game();
    assert_eq!(
        rejected(&mut game, "Mario", ActionPayload::ChooseMagician { magician: 0 }),
        GameError::InvalidPlayer {
            nickname: "Mario".into()
        }
    );
    assert_eq!(
        rejected(&mut game, "Fede", ActionPayload::ChooseMagician { magician: 0 }),
        GameError::NotRoundOwner {
            nickname: "Fede".into()
        }
    );
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::ChooseMagician { magician: 4 }).kind(),
        ErrorKind::Structural
    );

    let events = act(&mut game, "Ale", ActionPayload::ChooseMagician { magician: 2 }).unwrap();
    assert_eq!(
        events,
        vec![ModelEvent::RoundOwner {
            nickname: "Fede".into()
        }]
    );
    assert_eq!(
        rejected(&mut game, "Fede", ActionPayload::ChooseMagician { magician: 2 }),
        GameError::MagicianTaken { magician: 2 }
    );
}

#[test]
fn test_choose_magician_only_during_setup() {
    let mut game = in_planning();
    assert_eq!(game.state, GameState::PlanningChooseCard);
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::ChooseMagician { magician: 3 }),
        GameError::WrongState {
            state: GameState::PlanningChooseCard
        }
    );
}

#[test]
fn test_play_card() {
    let mut game = in_planning();
    assert_eq!(
        rejected(&mut game, "Fede", ActionPayload::PlayCard { value: 3 }).kind(),
        ErrorKind::NotRoundOwner
    );
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::PlayCard { value: 11 }),
        GameError::CardNotInHand { value: 11 }
    );

    act(&mut game, "Ale", ActionPayload::PlayCard { value: 3 }).unwrap();
    assert_eq!(game.player("Ale").unwrap().hand.len(), 9);
    assert_eq!(
        rejected(&mut game, "Fede", ActionPayload::PlayCard { value: 3 }),
        GameError::CardAlreadyPlayed { value: 3 }
    );
}

#[test]
fn test_play_card_duplicate_allowed_with_no_alternative() {
    let mut game = in_planning();
    act(&mut game, "Ale", ActionPayload::PlayCard { value: 3 }).unwrap();
    game.players[1].hand.retain(|c| c.value == 3);

    act(&mut game, "Fede", ActionPayload::PlayCard { value: 3 }).unwrap();
    assert_eq!(game.round_owner.as_deref(), Some("Davide"));
}

#[test]
fn test_move_student_to_hall() {
    let mut game = in_action_phase();
    assert_eq!(game.round_owner.as_deref(), Some("Ale"));

    assert_eq!(
        rejected(&mut game, "Davide", ActionPayload::MoveStudentToHall { color: Color::Red }).kind(),
        ErrorKind::NotRoundOwner
    );
    if let Some(color) = missing_color(&game, "Ale") {
        assert_eq!(
            rejected(&mut game, "Ale", ActionPayload::MoveStudentToHall { color }),
            GameError::MissingStudent { color }
        );
    }

    let color = Color::ALL
        .into_iter()
        .find(|c| game.player("Ale").unwrap().school.entry.contains(*c))
        .unwrap();
    game.players[0].school.hall.set(color, 10);
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::MoveStudentToHall { color }),
        GameError::HallFull { color }
    );

    game.players[0].school.hall.set(color, 0);
    act(&mut game, "Ale", ActionPayload::MoveStudentToHall { color }).unwrap();
    assert_eq!(game.player("Ale").unwrap().school.hall.get(color), 1);
    assert_eq!(game.professors.get(&color).map(String::as_str), Some("Ale"));
}

#[test]
fn test_move_student_to_island() {
    let mut game = in_action_phase();
    let color = Color::ALL
        .into_iter()
        .find(|c| game.player("Ale").unwrap().school.entry.contains(*c))
        .unwrap();

    assert_eq!(
        rejected(
            &mut game,
            "Ale",
            ActionPayload::MoveStudentToIsland { color, island: 12 }
        ),
        GameError::InvalidIndex {
            what: "island",
            index: 12,
            len: 12
        }
    );

    let before = game.islands.get(11).unwrap().students.get(color);
    let events = act(&mut game, "Ale", ActionPayload::MoveStudentToIsland { color, island: 11 }).unwrap();
    assert_eq!(game.islands.get(11).unwrap().students.get(color), before + 1);
    // only the island that changed is sent
    let islands: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ModelEvent::Island { position, island } => Some((*position, island.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(islands, vec![(11, game.islands.get(11).unwrap().clone())]);
    assert_eq!(game.player("Ale").unwrap().school.entry.total(), 8);
}

#[test]
fn test_quota_moves_to_mother_nature() {
    let mut game = in_action_phase();
    for moved in 0..4 {
        assert_eq!(game.state, GameState::ActionMoveStudents, "after {moved} moves");
        let color = Color::ALL
            .into_iter()
            .find(|c| game.player("Ale").unwrap().school.entry.contains(*c))
            .unwrap();
        act(&mut game, "Ale", ActionPayload::MoveStudentToIsland { color, island: 0 }).unwrap();
    }
    assert_eq!(game.state, GameState::ActionMoveMother);
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::MoveStudentToHall { color: Color::Red }),
        GameError::WrongState {
            state: GameState::ActionMoveMother
        }
    );

    // card 4 allows two steps
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::MoveMotherNature { steps: 3 }),
        GameError::InvalidMovement { steps: 3, max: 2 }
    );
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::MoveMotherNature { steps: 0 }),
        GameError::InvalidMovement { steps: 0, max: 2 }
    );
    act(&mut game, "Ale", ActionPayload::MoveMotherNature { steps: 2 }).unwrap();
    assert_eq!(game.state, GameState::ActionChooseCloud);
}

#[test]
fn test_choose_cloud() {
    let mut game = in_action_phase();
    for _ in 0..4 {
        let color = Color::ALL
            .into_iter()
            .find(|c| game.player("Ale").unwrap().school.entry.contains(*c))
            .unwrap();
        act(&mut game, "Ale", ActionPayload::MoveStudentToIsland { color, island: 0 }).unwrap();
    }
    act(&mut game, "Ale", ActionPayload::MoveMotherNature { steps: 1 }).unwrap();

    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::ChooseCloud { cloud: 3 }).kind(),
        ErrorKind::Structural
    );
    game.clouds[0].students.take_all();
    assert_eq!(
        rejected(&mut game, "Ale", ActionPayload::ChooseCloud { cloud: 0 }),
        GameError::EmptyCloud { index: 0 }
    );

    let events = act(&mut game, "Ale", ActionPayload::ChooseCloud { cloud: 1 }).unwrap();
    assert!(game.clouds[1].students.is_empty());
    assert_eq!(game.player("Ale").unwrap().school.entry.total(), 9);
    assert_eq!(game.round_owner.as_deref(), Some("Fede"));
    assert!(events.contains(&ModelEvent::RoundOwner {
        nickname: "Fede".into()
    }));
}

#[test]
fn test_card_actions_need_active_card() {
    let mut game = in_action_phase();
    let payloads = [
        ActionPayload::GrandmaBlock { island: 0 },
        ActionPayload::HeraldChoose { island: 0 },
        ActionPayload::MonkMove {
            color: Color::Red,
            island: 0,
        },
        ActionPayload::MushroomChoose { color: Color::Red },
        ActionPayload::PrincessMove { color: Color::Red },
        ActionPayload::ThiefChoose { color: Color::Red },
    ];
    for payload in payloads {
        assert_eq!(
            rejected(&mut game, "Ale", payload).kind(),
            ErrorKind::WrongState,
            "{payload:?}"
        );
    }
}
