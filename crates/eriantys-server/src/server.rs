//! WebSocket server and connection handling.

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{GameRoom, RoomError, RoomStatus};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use eriantys_core::{Action, ErrorKind, GameError};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Pings missed before a silent connection is dropped.
const MISSED_PINGS: u32 = 3;
const MAX_NICKNAME_LEN: usize = 24;

/// Server state shared across all connections.
///
/// Lock order: `player_rooms` before `rooms`. A room guard is never held
/// while another room is looked up or while messages are enqueued.
pub struct ServerState {
    pub config: ServerConfig,
    /// All open rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Connection -> nickname, once logged in
    pub connections: DashMap<Uuid, String>,
    /// Nickname -> room
    pub player_rooms: DashMap<String, Uuid>,
    pub outbound: Broadcaster,
    /// Last time anything was received on a connection
    pub last_seen: DashMap<Uuid, Instant>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            rooms: DashMap::new(),
            connections: DashMap::new(),
            player_rooms: DashMap::new(),
            outbound: Broadcaster::new(),
            last_seen: DashMap::new(),
        }
    }

    fn send(&self, conn_id: Uuid, msg: ServerMessage) {
        self.outbound.send(conn_id, msg);
    }

    fn send_error(&self, conn_id: Uuid, kind: ErrorKind, message: impl Into<String>) {
        self.send(conn_id, ServerMessage::error(kind, message));
    }

    fn nickname_of(&self, conn_id: Uuid) -> Option<String> {
        self.connections.get(&conn_id).map(|n| n.clone())
    }

    fn room_of(&self, nickname: &str) -> Option<Uuid> {
        self.player_rooms.get(nickname).map(|r| *r)
    }
}

pub fn validate_nickname(nickname: &str) -> bool {
    let len = nickname.chars().count();
    (1..=MAX_NICKNAME_LEN).contains(&len)
        && nickname
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Run the WebSocket server.
pub async fn run_server(state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(state.config.addr).await?;
    info!(addr = %state.config.addr, "Eriantys server listening");

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!(%peer_addr, "Connection error: {}", e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let conn_id = Uuid::new_v4();
    info!(%addr, %conn_id, "New WebSocket connection");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut rx = state.outbound.register(conn_id);
    state.last_seen.insert(conn_id, Instant::now());

    // Forward queued messages to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize outbound message: {}", e),
            }
        }
    });

    let mut ping_task = {
        let state = Arc::clone(&state);
        let period = state.config.ping_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let silent = state
                    .last_seen
                    .get(&conn_id)
                    .map(|seen| seen.elapsed() > period * MISSED_PINGS)
                    .unwrap_or(true);
                if silent {
                    warn!(%conn_id, "No answer to keepalive pings");
                    break;
                }
                if !state.outbound.send(conn_id, ServerMessage::Ping) {
                    break;
                }
            }
        })
    };

    loop {
        tokio::select! {
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    state.last_seen.insert(conn_id, Instant::now());
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => handle_message(conn_id, client_msg, &state),
                        Err(e) => {
                            warn!(%conn_id, "Invalid message: {}", e);
                            state.send_error(conn_id, ErrorKind::InvalidMove, e.to_string());
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!(%conn_id, "Client closing connection");
                    break;
                }
                Some(Ok(_)) => {
                    state.last_seen.insert(conn_id, Instant::now());
                }
                Some(Err(e)) => {
                    warn!(%conn_id, "WebSocket error: {}", e);
                    break;
                }
            },
            _ = &mut send_task => {
                debug!(%conn_id, "Writer stopped");
                break;
            }
            _ = &mut ping_task => {
                debug!(%conn_id, "Keepalive stopped");
                break;
            }
        }
    }

    send_task.abort();
    ping_task.abort();
    handle_disconnect(conn_id, &state);

    Ok(())
}

/// Handle a client message.
fn handle_message(conn_id: Uuid, msg: ClientMessage, state: &ServerState) {
    match msg {
        ClientMessage::Login { nickname } => handle_login(conn_id, nickname, state),
        ClientMessage::Setup {
            players,
            expert_mode,
        } => handle_setup(conn_id, players, expert_mode, state),
        ClientMessage::Action {
            kind,
            int0,
            int1: _,
            color0,
            color1,
        } => {
            let Some(nickname) = state.nickname_of(conn_id) else {
                state.send_error(conn_id, ErrorKind::InvalidPlayer, "log in first");
                return;
            };
            match Action::from_params(nickname, kind, int0, color0, color1) {
                Ok(action) => handle_action(conn_id, action, state),
                Err(e) => state.send_error(conn_id, e.kind(), e.to_string()),
            }
        }
        ClientMessage::Pong => {
            state.last_seen.insert(conn_id, Instant::now());
        }
    }
}

fn handle_login(conn_id: Uuid, nickname: String, state: &ServerState) {
    if state.connections.contains_key(&conn_id) {
        state.send_error(conn_id, ErrorKind::InvalidMove, "already logged in");
        return;
    }
    if !validate_nickname(&nickname) {
        state.send_error(
            conn_id,
            ErrorKind::InvalidNickname,
            format!("nicknames are 1 to {MAX_NICKNAME_LEN} letters, digits, '_' or '-'"),
        );
        return;
    }

    let entry = match state.player_rooms.entry(nickname.clone()) {
        Entry::Occupied(occupied) => {
            let room_id = *occupied.get();
            drop(occupied);
            reconnect(conn_id, nickname, room_id, state);
            return;
        }
        Entry::Vacant(vacant) => vacant,
    };

    // Join the first room still waiting for players, or open a new one
    let open_rooms: Vec<Uuid> = state
        .rooms
        .iter()
        .filter(|room| room.status == RoomStatus::Waiting && !room.is_full())
        .map(|room| room.id)
        .collect();

    let mut joined = None;
    for room_id in open_rooms {
        if let Some(mut room) = state.rooms.get_mut(&room_id) {
            if room.add_player(nickname.clone(), conn_id).is_ok() {
                joined = Some(room_id);
                break;
            }
        }
    }

    let (room_id, opened) = match joined {
        Some(room_id) => (room_id, false),
        None => {
            if state.rooms.len() >= state.config.max_rooms {
                warn!(%conn_id, nickname = %nickname, "Room limit reached");
                state.send_error(conn_id, ErrorKind::LobbyFull, "no room available");
                return;
            }
            let room_id = Uuid::new_v4();
            state
                .rooms
                .insert(room_id, GameRoom::new(room_id, nickname.clone(), conn_id));
            (room_id, true)
        }
    };
    entry.insert(room_id);
    state.connections.insert(conn_id, nickname.clone());

    info!(%conn_id, nickname = %nickname, %room_id, opened, "Player logged in");
    state.send(conn_id, ServerMessage::Connected { nickname: nickname.clone() });

    let (needs_setup, others) = match state.rooms.get(&room_id) {
        Some(room) => (
            room.needs_setup(),
            room.connections()
                .into_iter()
                .filter(|c| *c != conn_id)
                .collect::<Vec<_>>(),
        ),
        None => return,
    };
    state
        .outbound
        .broadcast(&others, &ServerMessage::custom(format!("{nickname} joined")));
    if opened && needs_setup {
        state.send(conn_id, ServerMessage::RequestSetup);
    }
    try_start(room_id, state);
}

fn reconnect(conn_id: Uuid, nickname: String, room_id: Uuid, state: &ServerState) {
    let result = match state.rooms.get_mut(&room_id) {
        Some(mut room) if room.is_absent(&nickname) => room
            .reconnect(&nickname, conn_id)
            .map(|game| (game, room.connections())),
        _ => {
            state.send_error(
                conn_id,
                ErrorKind::DuplicateNickname,
                format!("{nickname} is already in use"),
            );
            return;
        }
    };

    match result {
        Ok((game, conns)) => {
            state.connections.insert(conn_id, nickname.clone());
            info!(%conn_id, nickname = %nickname, %room_id, "Player reconnected");
            state.send(conn_id, ServerMessage::Connected { nickname: nickname.clone() });
            state.send(conn_id, ServerMessage::Resync { game: Box::new(game) });
            let others: Vec<Uuid> = conns.into_iter().filter(|c| *c != conn_id).collect();
            state
                .outbound
                .broadcast(&others, &ServerMessage::custom(format!("{nickname} reconnected")));
        }
        Err(e) => state.send_error(conn_id, e.kind(), e.to_string()),
    }
}

fn handle_setup(conn_id: Uuid, players: u8, expert_mode: bool, state: &ServerState) {
    let Some(nickname) = state.nickname_of(conn_id) else {
        state.send_error(conn_id, ErrorKind::InvalidPlayer, "log in first");
        return;
    };
    let Some(room_id) = state.room_of(&nickname) else {
        return;
    };

    let result = match state.rooms.get_mut(&room_id) {
        Some(mut room) => room.setup(&nickname, players, expert_mode),
        None => return,
    };
    match result {
        Ok(()) => {
            info!(%room_id, players, expert_mode, "Room set up");
            try_start(room_id, state);
        }
        Err(e) => state.send_error(conn_id, e.kind(), e.to_string()),
    }
}

/// Start the room's game if every seat is taken and send everyone the
/// initial state.
fn try_start(room_id: Uuid, state: &ServerState) {
    let started = {
        let Some(mut room) = state.rooms.get_mut(&room_id) else {
            return;
        };
        if !room.should_start() {
            return;
        }
        match room.start() {
            Ok(()) => {
                let conns = room.connections();
                room.game.as_mut().map(|game| {
                    game.drain_events();
                    (game.clone(), conns)
                })
            }
            Err(e) => {
                error!(%room_id, "Failed to start game: {}", e);
                None
            }
        }
    };

    if let Some((game, conns)) = started {
        info!(%room_id, players = game.player_count(), expert = game.expert_mode, "Game started");
        state
            .outbound
            .broadcast(&conns, &ServerMessage::Resync { game: Box::new(game) });
    }
}

fn handle_action(conn_id: Uuid, action: Action, state: &ServerState) {
    let Some(room_id) = state.room_of(&action.nickname) else {
        state.send_error(conn_id, ErrorKind::InvalidPlayer, "not in a room");
        return;
    };

    let (result, was_aborted, status, conns) = {
        let Some(mut room) = state.rooms.get_mut(&room_id) else {
            return;
        };
        let was_aborted = room.status == RoomStatus::Aborted;
        let result = room.apply_action(&action);
        (result, was_aborted, room.status, room.connections())
    };

    match result {
        Ok(events) => {
            debug!(%room_id, nickname = %action.nickname, kind = ?action.kind(), events = events.len(), "Action applied");
            state.outbound.broadcast_events(&conns, events);
            if status == RoomStatus::Finished {
                info!(%room_id, "Game finished");
            }
        }
        Err(RoomError::Aborted { reason }) if !was_aborted => {
            error!(%room_id, nickname = %action.nickname, kind = ?action.kind(), "Match aborted: {}", reason);
            state.outbound.broadcast(
                &conns,
                &ServerMessage::error(ErrorKind::MatchAborted, format!("match aborted: {reason}")),
            );
        }
        Err(e) => {
            if let RoomError::Game(GameError::InvalidMove(_)) = &e {
                warn!(%room_id, nickname = %action.nickname, "Malformed action: {}", e);
            }
            state.send_error(conn_id, e.kind(), e.to_string());
        }
    }
}

/// Handle a lost connection.
fn handle_disconnect(conn_id: Uuid, state: &ServerState) {
    state.outbound.unregister(conn_id);
    state.last_seen.remove(&conn_id);

    let Some((_, nickname)) = state.connections.remove(&conn_id) else {
        info!(%conn_id, "Anonymous connection closed");
        return;
    };
    let Some(room_id) = state.room_of(&nickname) else {
        return;
    };

    let outcome = state.rooms.get_mut(&room_id).map(|mut room| {
        room.disconnect(conn_id);
        let opener = room
            .needs_setup()
            .then(|| room.players.first().and_then(|p| p.connection))
            .flatten();
        let nicknames: Vec<String> = room.players.iter().map(|p| p.nickname.clone()).collect();
        (room.status, room.connections(), nicknames, opener)
    });
    let Some((status, conns, nicknames, opener)) = outcome else {
        state.player_rooms.remove(&nickname);
        return;
    };

    if status == RoomStatus::Waiting {
        state.player_rooms.remove(&nickname);
        info!(%room_id, nickname = %nickname, "Player left the lobby");
        state
            .outbound
            .broadcast(&conns, &ServerMessage::custom(format!("{nickname} left")));
        if let Some(opener) = opener {
            state.send(opener, ServerMessage::RequestSetup);
        }
    } else {
        info!(%room_id, nickname = %nickname, "Player disconnected");
        state
            .outbound
            .broadcast(&conns, &ServerMessage::custom(format!("{nickname} disconnected")));
    }

    if conns.is_empty() {
        state.rooms.remove(&room_id);
        for nickname in nicknames {
            state.player_rooms.remove(&nickname);
        }
        info!(%room_id, "Room closed");
    }
}
