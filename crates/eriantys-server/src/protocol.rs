//! WebSocket protocol messages for Eriantys multiplayer.

use eriantys_core::{ActionKind, Color, ErrorKind, Game, ModelEvent};
use serde::{Deserialize, Serialize};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Log in with a nickname (also used to reconnect)
    Login { nickname: String },

    /// Room settings, sent by the player who opened the room
    Setup { players: u8, expert_mode: bool },

    /// Submit a game action
    Action {
        kind: ActionKind,
        int0: Option<i64>,
        int1: Option<i64>,
        color0: Option<Color>,
        color1: Option<Color>,
    },

    /// Answer to a keepalive ping
    Pong,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Login accepted
    Connected { nickname: String },

    /// The room needs its player count and mode
    RequestSetup,

    /// Error occurred
    Error {
        kind: ErrorKind,
        message: Option<String>,
    },

    /// Free-form notice
    Custom { message: String },

    /// Keepalive
    Ping,

    /// One model change
    Update(ModelEvent),

    /// Full game state, sent on game start and on reconnection
    Resync { game: Box<Game> },
}

impl ServerMessage {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        ServerMessage::Custom {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_action_with_missing_fields() {
        let json = r#"{"type":"Action","payload":{"kind":"PLAY_CARD","int0":4}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Action {
                kind,
                int0,
                int1,
                color0,
                ..
            } => {
                assert_eq!(kind, ActionKind::PlayCard);
                assert_eq!(int0, Some(4));
                assert_eq!(int1, None);
                assert_eq!(color0, None);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_unit_messages() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Pong"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Pong));

        let json = serde_json::to_string(&ServerMessage::Ping).unwrap();
        assert_eq!(json, r#"{"type":"Ping"}"#);
    }

    #[test]
    fn test_update_wraps_event() {
        let msg = ServerMessage::Update(ModelEvent::MotherNature { position: 3 });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "Update");
        assert_eq!(value["payload"]["event"], "MotherNature");
        assert_eq!(value["payload"]["data"]["position"], 3);
    }

    #[test]
    fn test_error_message() {
        let msg = ServerMessage::error(ErrorKind::LobbyFull, "no room left");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["payload"]["kind"], "LobbyFull");
        assert_eq!(value["payload"]["message"], "no room left");
    }
}
