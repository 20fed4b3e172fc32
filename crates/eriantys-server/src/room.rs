//! Game room management.

use eriantys_core::{check_invariants, Action, ErrorKind, Game, GameError, ModelEvent};
use thiserror::Error;
use uuid::Uuid;

/// Most players a room accepts before its opener has chosen the size.
const MAX_PLAYERS: usize = 3;
const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
    Aborted,
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    LobbyFull,

    #[error("Room is already set up")]
    SetupAlreadyDone,

    #[error("Only the player who opened the room can set it up")]
    NotOpener,

    #[error("A game needs 2 or 3 players, {joined} already joined, got {requested}")]
    InvalidPlayerCount { requested: u8, joined: usize },

    #[error("Game not started")]
    GameNotStarted,

    #[error("Match aborted: {reason}")]
    Aborted { reason: String },

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::LobbyFull => ErrorKind::LobbyFull,
            RoomError::SetupAlreadyDone
            | RoomError::NotOpener
            | RoomError::InvalidPlayerCount { .. } => ErrorKind::RuleViolation,
            RoomError::GameNotStarted => ErrorKind::WrongState,
            RoomError::Aborted { .. } => ErrorKind::MatchAborted,
            RoomError::PlayerNotInRoom => ErrorKind::InvalidPlayer,
            RoomError::Game(err) => err.kind(),
        }
    }
}

/// A seat in a room. `connection` is `None` while the player is absent.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub nickname: String,
    pub connection: Option<Uuid>,
}

/// A match: the lobby before the game starts, then the game itself.
pub struct GameRoom {
    pub id: Uuid,
    /// Chosen by the opener through setup
    pub capacity: Option<usize>,
    pub expert_mode: bool,
    pub status: RoomStatus,
    /// Players in seating order
    pub players: Vec<RoomPlayer>,
    pub game: Option<Game>,
}

impl GameRoom {
    pub fn new(id: Uuid, opener: String, conn_id: Uuid) -> Self {
        Self {
            id,
            capacity: None,
            expert_mode: false,
            status: RoomStatus::Waiting,
            players: vec![RoomPlayer {
                nickname: opener,
                connection: Some(conn_id),
            }],
            game: None,
        }
    }

    pub fn opener(&self) -> Option<&str> {
        self.players.first().map(|p| p.nickname.as_str())
    }

    pub fn needs_setup(&self) -> bool {
        self.status == RoomStatus::Waiting && self.capacity.is_none()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity.unwrap_or(MAX_PLAYERS)
    }

    pub fn has_player(&self, nickname: &str) -> bool {
        self.players.iter().any(|p| p.nickname == nickname)
    }

    pub fn is_absent(&self, nickname: &str) -> bool {
        self.players
            .iter()
            .any(|p| p.nickname == nickname && p.connection.is_none())
    }

    /// Connections of every present player, in seating order.
    pub fn connections(&self) -> Vec<Uuid> {
        self.players.iter().filter_map(|p| p.connection).collect()
    }

    pub fn add_player(&mut self, nickname: String, conn_id: Uuid) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting || self.is_full() {
            return Err(RoomError::LobbyFull);
        }
        if self.has_player(&nickname) {
            return Err(GameError::DuplicateNickname(nickname).into());
        }
        self.players.push(RoomPlayer {
            nickname,
            connection: Some(conn_id),
        });
        Ok(())
    }

    /// Fix the room size and game mode. Only the opener may do this, once.
    pub fn setup(&mut self, nickname: &str, players: u8, expert_mode: bool) -> Result<(), RoomError> {
        if self.opener() != Some(nickname) {
            return Err(RoomError::NotOpener);
        }
        if !self.needs_setup() {
            return Err(RoomError::SetupAlreadyDone);
        }
        let requested = players as usize;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&requested) || requested < self.players.len() {
            return Err(RoomError::InvalidPlayerCount {
                requested: players,
                joined: self.players.len(),
            });
        }
        self.capacity = Some(requested);
        self.expert_mode = expert_mode;
        Ok(())
    }

    pub fn should_start(&self) -> bool {
        self.status == RoomStatus::Waiting
            && self
                .capacity
                .is_some_and(|capacity| self.players.len() == capacity)
    }

    pub fn start(&mut self) -> Result<(), RoomError> {
        if !self.should_start() {
            return Err(RoomError::GameNotStarted);
        }
        let nicknames = self.players.iter().map(|p| p.nickname.clone()).collect();
        self.game = Some(Game::new(nicknames, self.expert_mode)?);
        self.status = RoomStatus::InGame;
        Ok(())
    }

    /// Perform an action and return the model events it produced. The game
    /// invariants are checked after every successful action; a violation
    /// aborts the match.
    pub fn apply_action(&mut self, action: &Action) -> Result<Vec<ModelEvent>, RoomError> {
        match self.status {
            RoomStatus::Waiting => return Err(RoomError::GameNotStarted),
            RoomStatus::Aborted => {
                return Err(RoomError::Aborted {
                    reason: "the match was stopped".into(),
                })
            }
            RoomStatus::InGame | RoomStatus::Finished => {}
        }
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;

        let events = game.apply_action(action)?;

        let violations = check_invariants(game);
        if !violations.is_empty() {
            self.status = RoomStatus::Aborted;
            let reason = violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RoomError::Aborted { reason });
        }

        if game.is_finished() {
            self.status = RoomStatus::Finished;
        }
        Ok(events)
    }

    /// Handle a lost connection. Before the game starts the seat is freed;
    /// afterwards the player is kept as absent. Returns the nickname.
    pub fn disconnect(&mut self, conn_id: Uuid) -> Option<String> {
        let idx = self
            .players
            .iter()
            .position(|p| p.connection == Some(conn_id))?;
        if self.status == RoomStatus::Waiting {
            Some(self.players.remove(idx).nickname)
        } else {
            self.players[idx].connection = None;
            Some(self.players[idx].nickname.clone())
        }
    }

    /// Reattach an absent player and return the game to resync them with.
    pub fn reconnect(&mut self, nickname: &str, conn_id: Uuid) -> Result<Game, RoomError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.nickname == nickname && p.connection.is_none())
            .ok_or(RoomError::PlayerNotInRoom)?;
        player.connection = Some(conn_id);
        self.game.clone().ok_or(RoomError::GameNotStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eriantys_core::{ActionPayload, Color, GameState};
    use pretty_assertions::assert_eq;

    fn full_room(players: u8) -> GameRoom {
        let mut room = GameRoom::new(Uuid::new_v4(), "Ale".to_string(), Uuid::new_v4());
        room.setup("Ale", players, false).unwrap();
        room.add_player("Fede".to_string(), Uuid::new_v4()).unwrap();
        if players == 3 {
            room.add_player("Davide".to_string(), Uuid::new_v4()).unwrap();
        }
        room
    }

    fn started_room() -> GameRoom {
        let mut room = full_room(2);
        room.game = Some(Game::with_seed(vec!["Ale".into(), "Fede".into()], false, 7).unwrap());
        room.status = RoomStatus::InGame;
        room
    }

    #[test]
    fn test_create_room() {
        let conn = Uuid::new_v4();
        let room = GameRoom::new(Uuid::new_v4(), "Ale".to_string(), conn);

        assert_eq!(room.opener(), Some("Ale"));
        assert!(room.needs_setup());
        assert!(!room.is_full());
        assert_eq!(room.connections(), vec![conn]);
        assert_eq!(room.status, RoomStatus::Waiting);
    }

    #[test]
    fn test_add_players() {
        let mut room = full_room(2);
        assert!(room.is_full());
        assert!(matches!(
            room.add_player("Davide".to_string(), Uuid::new_v4()),
            Err(RoomError::LobbyFull)
        ));

        let mut room = GameRoom::new(Uuid::new_v4(), "Ale".to_string(), Uuid::new_v4());
        let err = room.add_player("Ale".to_string(), Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateNickname);
    }

    #[test]
    fn test_setup() {
        let mut room = GameRoom::new(Uuid::new_v4(), "Ale".to_string(), Uuid::new_v4());
        room.add_player("Fede".to_string(), Uuid::new_v4()).unwrap();
        room.add_player("Davide".to_string(), Uuid::new_v4()).unwrap();

        assert!(matches!(room.setup("Fede", 3, false), Err(RoomError::NotOpener)));
        assert!(matches!(
            room.setup("Ale", 4, false),
            Err(RoomError::InvalidPlayerCount { requested: 4, .. })
        ));
        // three already joined
        assert!(matches!(
            room.setup("Ale", 2, false),
            Err(RoomError::InvalidPlayerCount { joined: 3, .. })
        ));

        room.setup("Ale", 3, true).unwrap();
        assert!(room.expert_mode);
        assert!(room.should_start());
        assert!(matches!(
            room.setup("Ale", 3, true),
            Err(RoomError::SetupAlreadyDone)
        ));
    }

    #[test]
    fn test_start_game() {
        let mut room = GameRoom::new(Uuid::new_v4(), "Ale".to_string(), Uuid::new_v4());
        assert!(room.start().is_err());

        room.setup("Ale", 2, false).unwrap();
        assert!(!room.should_start());
        room.add_player("Fede".to_string(), Uuid::new_v4()).unwrap();

        room.start().unwrap();
        assert_eq!(room.status, RoomStatus::InGame);
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.player_count(), 2);
        assert_eq!(game.state, GameState::Setup);
    }

    #[test]
    fn test_action_before_start() {
        let mut room = full_room(2);
        let action = Action::new("Ale", ActionPayload::ChooseMagician { magician: 0 });
        assert!(matches!(
            room.apply_action(&action),
            Err(RoomError::GameNotStarted)
        ));
    }

    #[test]
    fn test_apply_action() {
        let mut room = started_room();

        let err = room
            .apply_action(&Action::new("Fede", ActionPayload::ChooseMagician { magician: 0 }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotRoundOwner);
        assert_eq!(room.status, RoomStatus::InGame);

        let events = room
            .apply_action(&Action::new("Ale", ActionPayload::ChooseMagician { magician: 0 }))
            .unwrap();
        assert!(!events.is_empty());
    }

    #[test]
    fn test_invariant_violation_aborts_match() {
        let mut room = started_room();
        if let Some(game) = room.game.as_mut() {
            game.players[0].school.hall.set(Color::Red, 5);
        }

        let err = room
            .apply_action(&Action::new("Ale", ActionPayload::ChooseMagician { magician: 0 }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MatchAborted);
        assert_eq!(room.status, RoomStatus::Aborted);

        let err = room
            .apply_action(&Action::new("Fede", ActionPayload::ChooseMagician { magician: 1 }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MatchAborted);
    }

    #[test]
    fn test_disconnect_before_start_frees_seat() {
        let conn = Uuid::new_v4();
        let mut room = GameRoom::new(Uuid::new_v4(), "Ale".to_string(), Uuid::new_v4());
        room.add_player("Fede".to_string(), conn).unwrap();

        assert_eq!(room.disconnect(conn), Some("Fede".to_string()));
        assert!(!room.has_player("Fede"));
        assert_eq!(room.disconnect(conn), None);
    }

    #[test]
    fn test_disconnect_and_reconnect_in_game() {
        let mut room = started_room();
        let conn = room.players[1].connection.unwrap();

        assert_eq!(room.disconnect(conn), Some("Fede".to_string()));
        assert!(room.is_absent("Fede"));
        assert_eq!(room.connections().len(), 1);

        let new_conn = Uuid::new_v4();
        let game = room.reconnect("Fede", new_conn).unwrap();
        assert_eq!(game.player_count(), 2);
        assert!(!room.is_absent("Fede"));
        assert!(room.connections().contains(&new_conn));

        assert!(matches!(
            room.reconnect("Ale", Uuid::new_v4()),
            Err(RoomError::PlayerNotInRoom)
        ));
    }
}
