use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::*;
use crate::game::clock::Clock;
use crate::game::entity::Entity;
use crate::game::highscores::HighscoreEntry;
use crate::game::world::{TickOutcome, World};
use crate::protocol::messages::*;

pub type SharedWorld = Arc<RwLock<World>>;

/// Fan-out from the tick loop to every connection.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Snapshot(Arc<ServerMessage>),
    Eliminated { player_id: u64, score: u64 },
    Highscores(Vec<HighscoreEntry>),
}

pub fn create_world(config: WorldConfig, clock: Arc<dyn Clock>) -> SharedWorld {
    Arc::new(RwLock::new(World::new(config, clock)))
}

pub async fn game_loop(world: SharedWorld, events: broadcast::Sender<GameEvent>) {
    let mut tick_interval = interval(Duration::from_millis(TICK_DURATION_MS));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick_interval.tick().await;
        let (outcome, snapshot) = {
            let mut w = world.write().await;
            let outcome = w.tick();
            let snapshot = outcome.ran.then(|| build_snapshot(&w));
            (outcome, snapshot)
        };
        publish(outcome, snapshot, &events);
    }
}

/// Board goes out before the elimination: the eliminated connection closes on that event.
fn publish(outcome: TickOutcome, snapshot: Option<ServerMessage>, events: &broadcast::Sender<GameEvent>) {
    // Sends only fail when nobody is listening
    if let Some(board) = outcome.highscores {
        let _ = events.send(GameEvent::Highscores(board));
    }
    if let Some(e) = outcome.eliminated {
        let _ = events.send(GameEvent::Eliminated {
            player_id: e.player_id,
            score: e.score,
        });
    }
    if let Some(snapshot) = snapshot {
        let _ = events.send(GameEvent::Snapshot(Arc::new(snapshot)));
    }
}

pub fn entity_state(entity: &Entity) -> EntityState {
    let brain = entity.brain();
    EntityState {
        id: entity.id,
        name: entity.name.clone(),
        color: entity.color.clone(),
        x: entity.x,
        y: entity.y,
        radius: entity.radius,
        score: entity.score,
        cells: entity
            .cells
            .iter()
            .map(|c| CellState {
                id: c.id,
                x: c.x,
                y: c.y,
                radius: c.radius,
                score: c.score,
                merge_at: c.merge_at,
            })
            .collect(),
        species: brain.map(|b| b.species),
        personality: brain.map(|b| b.personality()),
    }
}

/// Full world state; the single-player world is small enough to send whole every tick.
pub fn build_snapshot(world: &World) -> ServerMessage {
    ServerMessage::WorldSnapshot {
        players: world.player.iter().map(entity_state).collect(),
        npcs: world.npcs.values().map(entity_state).collect(),
        foods: world
            .foods
            .items
            .iter()
            .map(|f| FoodState {
                id: f.id,
                x: f.x,
                y: f.y,
                radius: f.radius,
                color: f.color.clone(),
                name: f.name,
                kind: f.kind,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::ManualClock;
    use crate::game::world::Elimination;

    #[test]
    fn snapshot_carries_every_entity_and_food() {
        let config = WorldConfig {
            world_size: 1000.0,
            max_food: 30,
            max_npcs: 4,
            seed: Some(1),
        };
        let mut world = World::new(config, Arc::new(ManualClock::new(0)));
        world.start_game("snap").unwrap();
        let ServerMessage::WorldSnapshot { players, npcs, foods } = build_snapshot(&world) else {
            panic!("expected a world snapshot");
        };
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].cells.len(), 1);
        assert!(players[0].species.is_none());
        assert_eq!(npcs.len(), 4);
        assert!(npcs.iter().all(|n| n.personality.is_some()));
        assert_eq!(foods.len(), 30);
    }

    #[test]
    fn elimination_board_is_published_before_the_close_event() {
        let (tx, mut rx) = broadcast::channel(8);
        let outcome = TickOutcome {
            ran: true,
            eliminated: Some(Elimination { player_id: 7, score: 120 }),
            highscores: Some(Vec::new()),
        };
        publish(outcome, None, &tx);
        assert!(matches!(rx.try_recv(), Ok(GameEvent::Highscores(_))));
        assert!(matches!(
            rx.try_recv(),
            Ok(GameEvent::Eliminated { player_id: 7, score: 120 })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn loop_broadcasts_snapshots_only_while_a_player_exists() {
        let clock = Arc::new(ManualClock::new(0));
        let config = WorldConfig {
            world_size: 1000.0,
            max_food: 10,
            max_npcs: 0,
            seed: Some(2),
        };
        let world = create_world(config, clock);
        let (tx, mut rx) = broadcast::channel(64);
        let handle = tokio::spawn(game_loop(world.clone(), tx));

        tokio::time::sleep(Duration::from_millis(TICK_DURATION_MS * 5)).await;
        assert!(rx.try_recv().is_err());

        world.write().await.start_game("live").unwrap();
        tokio::time::sleep(Duration::from_millis(TICK_DURATION_MS * 3)).await;
        assert!(matches!(rx.try_recv(), Ok(GameEvent::Snapshot(_))));
        handle.abort();
    }
}
