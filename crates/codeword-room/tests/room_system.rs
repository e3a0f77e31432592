//! Integration tests for the room system: manager, actors, store,
//! fan-out and the turn clock working together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use codeword_protocol::{
    Cell, CellColor, EndOutcome, Notification, Player, Role, RoomCode, Team, Username,
};
use codeword_room::{
    Board, BroadcastFanout, Departure, ErrorKind, ExpirySignal, GameConfig, MemoryStore,
    RandomBoardGenerator, Room, RoomError, RoomManager, RoomState, RoomStore, StoreError,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::time::timeout;

// =========================================================================
// Test store that can be told to fail writes.
// =========================================================================

#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl RoomStore for FlakyStore {
    async fn get(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        self.inner.get(code).await
    }

    async fn put(&self, room: &Room) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(room).await
    }

    async fn delete(&self, code: &RoomCode) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(code).await
    }
}

// =========================================================================
// Helpers
// =========================================================================

type Manager = RoomManager<FlakyStore, BroadcastFanout>;

struct Harness {
    manager: Arc<Manager>,
    store: Arc<FlakyStore>,
    fanout: Arc<BroadcastFanout>,
}

fn harness() -> Harness {
    let store = Arc::new(FlakyStore::default());
    let fanout = Arc::new(BroadcastFanout::default());
    let config = GameConfig {
        board_size: 5,
        ..GameConfig::default()
    };
    let manager = RoomManager::new(
        Arc::clone(&store),
        Arc::clone(&fanout),
        Arc::new(RandomBoardGenerator::new()),
        config,
    );
    Harness {
        manager,
        store,
        fanout,
    }
}

fn code(s: &str) -> RoomCode {
    RoomCode::parse(s).unwrap()
}

fn name(s: &str) -> Username {
    Username::parse(s).unwrap()
}

fn player(s: &str, role: Role, team: Team) -> Player {
    Player::new(name(s), role, team)
}

/// `[Red, Blue, Neutral, Assassin, Red]`
fn small_board() -> Board {
    Board::new(vec![
        Cell::new("apple", CellColor::Red),
        Cell::new("berlin", CellColor::Blue),
        Cell::new("cloud", CellColor::Neutral),
        Cell::new("dragon", CellColor::Assassin),
        Cell::new("engine", CellColor::Red),
    ])
    .unwrap()
}

async fn create(h: &Harness, room: &RoomCode) {
    h.manager
        .create_room_with_board(
            room.clone(),
            small_board(),
            player("red-spy", Role::Spymaster, Team::Red),
        )
        .await
        .unwrap();
}

async fn create_balanced(h: &Harness, room: &RoomCode) {
    create(h, room).await;
    for p in [
        player("red-agent", Role::Agent, Team::Red),
        player("blue-spy", Role::Spymaster, Team::Blue),
        player("blue-agent", Role::Agent, Team::Blue),
    ] {
        h.manager.join(room, p).await.unwrap();
    }
}

async fn next_event(rx: &mut broadcast::Receiver<Notification>) -> Notification {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no notification within 1s")
        .expect("channel closed")
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

// =========================================================================
// Creation
// =========================================================================

#[tokio::test]
async fn test_create_room_publishes_roster_and_rejects_duplicate() {
    let h = harness();
    let room = code("TEST111");
    let mut rx = h.fanout.subscribe(&room);

    create(&h, &room).await;
    assert!(matches!(
        next_event(&mut rx).await,
        Notification::RosterUpdated { players } if players.len() == 1
    ));
    assert_eq!(h.manager.room_count().await, 1);

    let err = h
        .manager
        .create_room_with_board(room.clone(), small_board(), player("x", Role::Agent, Team::Red))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::DuplicateRoom(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_create_room_board_size_must_match_config() {
    let h = harness();
    let big = RandomBoardGenerator::new();
    let board = codeword_room::BoardGenerator::generate(&big, 25).unwrap();
    let err = h
        .manager
        .create_room_with_board(code("R1"), board, player("a", Role::Agent, Team::Red))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::InvalidBoard(_)));
    assert_eq!(h.manager.room_count().await, 0);
}

#[tokio::test]
async fn test_create_room_with_generated_board() {
    let h = harness();
    let room = code("GEN1");
    h.manager
        .create_room(room.clone(), player("a", Role::Agent, Team::Red))
        .await
        .unwrap();
    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.board().len(), 5);
    assert_eq!(snapshot.state(), RoomState::Waiting);
}

#[tokio::test]
async fn test_create_room_with_random_code() {
    let h = harness();
    let (room, notifications) = h
        .manager
        .create_room_with_random_code(player("a", Role::Agent, Team::Red))
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(h.manager.room_codes().await, vec![room.clone()]);
    assert!(h.store.get(&room).await.unwrap().is_some());
}

#[tokio::test]
async fn test_operations_on_missing_room() {
    let h = harness();
    let missing = code("NOPE");
    assert!(matches!(
        h.manager.join(&missing, player("a", Role::Agent, Team::Red)).await,
        Err(RoomError::RoomNotFound(_))
    ));
    assert!(matches!(
        h.manager.start(&missing).await,
        Err(RoomError::RoomNotFound(_))
    ));
    assert!(!h.manager.expire_turn(&missing, ExpirySignal::External { observed: None }).await);
}

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test]
async fn test_start_arms_clock_and_publishes() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    let mut rx = h.fanout.subscribe(&room);

    let notes = h.manager.start(&room).await.unwrap();
    let Notification::GameStarted {
        turn_team,
        turn_deadline,
    } = next_event(&mut rx).await
    else {
        panic!("expected game-started");
    };
    assert_eq!(notes.len(), 1);
    assert_eq!(turn_team, Team::Red);
    assert_eq!(h.manager.clock().pending(&room), Some(turn_deadline));
}

#[tokio::test]
async fn test_hint_and_reveal_through_manager() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    h.manager.start(&room).await.unwrap();
    let mut rx = h.fanout.subscribe(&room);

    h.manager
        .submit_hint(&room, &name("red-spy"), "machine")
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        Notification::HintPosted {
            team: Team::Red,
            text: "machine".into()
        }
    );

    let err = h
        .manager
        .reveal_tile_as(&room, &name("blue-agent"), 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    h.manager
        .reveal_tile_as(&room, &name("red-agent"), 0)
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        Notification::TileUpdated {
            index: 0,
            color: CellColor::Red
        }
    );
    let Notification::TurnSwitched {
        turn_team,
        turn_deadline,
    } = next_event(&mut rx).await
    else {
        panic!("expected turn-switched");
    };
    assert_eq!(turn_team, Team::Blue);
    assert_eq!(h.manager.clock().pending(&room), Some(turn_deadline));

    // Re-reveal: nothing happens, nothing is published.
    assert!(h.manager.reveal_tile(&room, 0).await.unwrap().is_empty());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    // Blue reveals the assassin and loses.
    h.manager
        .reveal_tile_as(&room, &name("blue-agent"), 3)
        .await
        .unwrap();
    let events = drain(&mut rx);
    assert_eq!(
        events.last(),
        Some(&Notification::GameEnded {
            outcome: EndOutcome::AssassinRevealed {
                losing_team: Team::Blue
            }
        })
    );
    assert_eq!(h.manager.clock().pending(&room), None);
    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.state(), RoomState::Ended);
}

#[tokio::test]
async fn test_pause_disarms_and_resume_rearms_same_deadline() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    h.manager.start(&room).await.unwrap();
    let deadline = h.manager.clock().pending(&room).unwrap();
    let mut rx = h.fanout.subscribe(&room);

    let departure = h.manager.leave(&room, &name("blue-agent")).await.unwrap();
    let Departure::Left(notes) = departure else {
        panic!("room should survive");
    };
    assert_eq!(notes.last(), Some(&Notification::GamePaused));
    assert_eq!(h.manager.clock().pending(&room), None);

    h.manager
        .join(&room, player("new-blue", Role::Agent, Team::Blue))
        .await
        .unwrap();
    let events = drain(&mut rx);
    assert_eq!(events.last(), Some(&Notification::GameResumed));

    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.state(), RoomState::Active);
    assert_eq!(snapshot.turn_team(), Team::Red);
    assert_eq!(snapshot.turn_deadline(), Some(deadline));
    assert_eq!(h.manager.clock().pending(&room), Some(deadline));
}

#[tokio::test]
async fn test_last_player_leaving_deletes_room() {
    let h = harness();
    let room = code("R1");
    let mut rx = h.fanout.subscribe(&room);
    create(&h, &room).await;
    let _ = next_event(&mut rx).await;

    let departure = h.manager.leave(&room, &name("red-spy")).await.unwrap();
    assert_eq!(departure, Departure::RoomDeleted);

    assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    assert!(h.store.get(&room).await.unwrap().is_none());
    assert_eq!(h.manager.room_count().await, 0);
    assert!(matches!(
        h.manager.join(&room, player("late", Role::Agent, Team::Red)).await,
        Err(RoomError::RoomNotFound(_))
    ));

    // The code is free again.
    create(&h, &room).await;
    assert_eq!(h.manager.room_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_joins_are_serialized() {
    let h = harness();
    let room = code("R1");
    create(&h, &room).await;

    let mut tasks = Vec::new();
    for i in 0..10 {
        let manager = Arc::clone(&h.manager);
        let room = room.clone();
        tasks.push(tokio::spawn(async move {
            manager
                .join(&room, player(&format!("agent-{i}"), Role::Agent, Team::Blue))
                .await
        }));
    }
    // Everyone races for the same Blue Spymaster seat too.
    let mut spy_tasks = Vec::new();
    for i in 0..5 {
        let manager = Arc::clone(&h.manager);
        let room = room.clone();
        spy_tasks.push(tokio::spawn(async move {
            manager
                .join(&room, player(&format!("spy-{i}"), Role::Spymaster, Team::Blue))
                .await
        }));
    }

    for t in tasks {
        t.await.unwrap().unwrap();
    }
    let mut spies = 0;
    for t in spy_tasks {
        match t.await.unwrap() {
            Ok(_) => spies += 1,
            Err(e) => assert!(matches!(e, RoomError::RoleConflict(Team::Blue))),
        }
    }
    assert_eq!(spies, 1);

    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.players().len(), 12);
}

// =========================================================================
// Turn clock
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_clock_switches_turn_once_per_elapsed_turn() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    let mut rx = h.fanout.subscribe(&room);
    h.manager.start(&room).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, Notification::GameStarted { .. }));

    let first = timeout(Duration::from_secs(120), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        first,
        Notification::TurnSwitched {
            turn_team: Team::Blue,
            ..
        }
    ));

    // Nothing more until the next full turn has elapsed.
    assert!(timeout(Duration::from_secs(30), rx.recv()).await.is_err());

    let second = timeout(Duration::from_secs(120), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        second,
        Notification::TurnSwitched {
            turn_team: Team::Red,
            ..
        }
    ));
}

#[tokio::test]
async fn test_duplicate_and_stale_expiry_are_ignored() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    h.manager.start(&room).await.unwrap();
    let first = h.manager.clock().pending(&room).unwrap();

    // A reveal ends the turn early; the old deadline is now stale.
    h.manager.reveal_tile(&room, 2).await.unwrap();
    let second = h.manager.clock().pending(&room).unwrap();
    assert!(second > first);
    assert!(!h.manager.expire_turn(&room, ExpirySignal::Clock(first)).await);

    // The live deadline is accepted exactly once.
    assert!(h.manager.expire_turn(&room, ExpirySignal::Clock(second)).await);
    assert!(!h.manager.expire_turn(&room, ExpirySignal::Clock(second)).await);

    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.turn_team(), Team::Red);
}

#[tokio::test]
async fn test_external_expiry_before_deadline_is_ignored() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    h.manager.start(&room).await.unwrap();
    let deadline = h.manager.clock().pending(&room);

    let switched = h
        .manager
        .expire_turn(&room, ExpirySignal::External { observed: deadline })
        .await;
    assert!(!switched);
    assert_eq!(h.manager.snapshot(&room).await.unwrap().turn_team(), Team::Red);
}

// =========================================================================
// Failures and recovery
// =========================================================================

#[tokio::test]
async fn test_store_failure_changes_nothing_and_publishes_nothing() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    let mut rx = h.fanout.subscribe(&room);

    h.store.set_failing(true);
    let err = h.manager.start(&room).await.unwrap_err();
    assert!(matches!(err, RoomError::Store(StoreError::Unavailable(_))));
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(h.manager.clock().pending(&room), None);
    assert_eq!(
        h.manager.snapshot(&room).await.unwrap().state(),
        RoomState::Waiting
    );

    // The caller retries once the store is back.
    h.store.set_failing(false);
    h.manager.start(&room).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, Notification::GameStarted { .. }));
}

#[tokio::test]
async fn test_rooms_come_back_after_shutdown_with_clock_rearmed() {
    let h = harness();
    let room = code("R1");
    create_balanced(&h, &room).await;
    h.manager.start(&room).await.unwrap();
    let deadline = h.manager.clock().pending(&room).unwrap();

    h.manager.shutdown().await;
    assert_eq!(h.manager.clock().pending_count(), 0);
    assert_eq!(h.manager.room_count().await, 0);

    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.state(), RoomState::Active);
    assert_eq!(h.manager.clock().pending(&room), Some(deadline));
    assert_eq!(h.manager.room_count().await, 1);
}

#[tokio::test]
async fn test_shutdown_lets_queued_operations_finish() {
    let h = harness();
    let room = code("R1");
    create(&h, &room).await;

    let mut joins = Vec::new();
    for i in 0..5 {
        let manager = Arc::clone(&h.manager);
        let room = room.clone();
        joins.push(tokio::spawn(async move {
            manager
                .join(&room, player(&format!("agent-{i}"), Role::Agent, Team::Blue))
                .await
        }));
    }
    // Let every join reach the room's queue.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    h.manager.shutdown().await;
    let stored = h.store.get(&room).await.unwrap().unwrap();

    let mut accepted = 0;
    for join in joins {
        if join.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(stored.players().len(), 1 + accepted);

    // The next operation gets a fresh actor that sees every queued join.
    let snapshot = h.manager.snapshot(&room).await.unwrap();
    assert_eq!(snapshot, stored);
}

#[tokio::test]
async fn test_rooms_are_independent() {
    let h = harness();
    let a = code("A");
    let b = code("B");
    create_balanced(&h, &a).await;
    create_balanced(&h, &b).await;

    h.manager.start(&a).await.unwrap();
    assert_eq!(h.manager.snapshot(&a).await.unwrap().state(), RoomState::Active);
    assert_eq!(h.manager.snapshot(&b).await.unwrap().state(), RoomState::Waiting);
    assert_eq!(h.manager.clock().pending_count(), 1);
}
