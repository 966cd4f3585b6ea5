use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::config::*;
use crate::error::GameError;
use crate::game::engine::{build_snapshot, entity_state, GameEvent, SharedWorld};
use crate::protocol::messages::{ClientMessage, ServerMessage};

#[derive(Clone)]
pub struct WsState {
    pub world: SharedWorld,
    pub events: broadcast::Sender<GameEvent>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WsState) {
    let (mut sender, mut receiver) = socket.split();
    let player_id = Arc::new(RwLock::new(None::<u64>));
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Menu needs the board before any game starts
    let board = state.world.read().await.highscores.top().to_vec();
    let _ = tx.send(ServerMessage::Highscores { entries: board });

    // Task: forward messages from channel to websocket
    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!("failed to encode message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Task: relay tick-loop events relevant to this connection
    let mut events = state.events.subscribe();
    let event_world = state.world.clone();
    let event_player = player_id.clone();
    let event_tx = tx.clone();
    let event_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "connection lagging behind tick loop");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match event {
                GameEvent::Snapshot(snapshot) => {
                    if event_player.read().await.is_some()
                        && event_tx.send((*snapshot).clone()).is_err()
                    {
                        break;
                    }
                }
                GameEvent::Highscores(entries) => {
                    if event_tx.send(ServerMessage::Highscores { entries }).is_err() {
                        break;
                    }
                }
                GameEvent::Eliminated { player_id: eliminated, score } => {
                    let mut mine = event_player.write().await;
                    if *mine != Some(eliminated) {
                        continue;
                    }
                    *mine = None;
                    drop(mine);
                    let _ = event_tx.send(ServerMessage::PlayerEliminated { score });
                    let reset = build_snapshot(&*event_world.read().await);
                    let _ = event_tx.send(reset);
                    sleep(Duration::from_millis(ELIMINATION_CLOSE_DELAY_MS)).await;
                    break;
                }
            }
        }
    });

    // Main loop: receive intents from client
    let recv_world = state.world.clone();
    let recv_player = player_id.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(intent) => handle_intent(intent, &recv_world, &recv_player, &tx).await,
                    Err(e) => debug!("ignoring malformed frame: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for any task to finish
    tokio::select! {
        _ = forward_task => {},
        _ = event_task => {},
        _ = recv_task => {},
    }

    let id = *player_id.read().await;
    if let Some(id) = id {
        cleanup(&state, id).await;
    }
}

async fn handle_intent(
    intent: ClientMessage,
    world: &SharedWorld,
    player_id: &RwLock<Option<u64>>,
    tx: &mpsc::UnboundedSender<ServerMessage>,
) {
    let current = *player_id.read().await;
    let mut w = world.write().await;
    // Invalid intents are dropped: client and server race during teardown
    let result = match (intent, current) {
        (ClientMessage::StartGame { name }, _) => match w.start_game(&name) {
            Ok(id) => {
                *player_id.write().await = Some(id);
                if let Some(player) = w.player.as_ref() {
                    let _ = tx.send(ServerMessage::Init {
                        player: entity_state(player),
                        world_size: w.config.world_size,
                    });
                }
                let _ = tx.send(build_snapshot(&w));
                Ok(())
            }
            Err(GameError::WorldFull) => {
                let _ = tx.send(ServerMessage::WorldFull {
                    message: GameError::WorldFull.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        },
        (ClientMessage::Move { x, y }, Some(id)) => w.set_target(id, x, y),
        (ClientMessage::Split, Some(id)) => w.split_player(id),
        (ClientMessage::SetName { name }, Some(id)) => w.rename_player(id, &name),
        (_, None) => Err(GameError::NoActivePlayer),
    };
    if let Err(e) = result {
        debug!("intent dropped: {}", e);
    }
}

async fn cleanup(state: &WsState, player_id: u64) {
    let board = state.world.write().await.disconnect(player_id);
    if let Some(board) = board {
        let _ = state.events.send(GameEvent::Highscores(board));
    }
}
