//! Integration tests for the turn clock.
//!
//! All async tests run with paused, auto-advancing tokio time, so a
//! 60-second turn resolves instantly. Deadlines are wall-clock
//! timestamps; only the sleeping is virtual.

use std::time::Duration;

use codeword_clock::{ClockConfig, Expiry, TurnClock};
use codeword_protocol::{RoomCode, Timestamp};
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

fn room(code: &str) -> RoomCode {
    RoomCode::parse(code).unwrap()
}

fn in_secs(secs: u64) -> Timestamp {
    Timestamp::now().after(Duration::from_secs(secs))
}

// =========================================================================
// ClockConfig
// =========================================================================

#[test]
fn test_default_slack() {
    assert_eq!(ClockConfig::default().slack, Duration::from_millis(25));
}

#[test]
fn test_validated_clamps_slack() {
    let cfg = ClockConfig {
        slack: Duration::from_secs(30),
    }
    .validated();
    assert_eq!(cfg.slack, ClockConfig::MAX_SLACK);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_armed_timer_fires_with_its_deadline() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    let code = room("R1");
    let deadline = in_secs(60);

    clock.arm(&code, deadline);
    assert_eq!(clock.pending(&code), Some(deadline));

    let expiry = rx.recv().await.unwrap();
    assert_eq!(
        expiry,
        Expiry {
            room: code.clone(),
            deadline
        }
    );
    assert_eq!(clock.pending(&code), None);
    assert_eq!(clock.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_past_deadline_fires_promptly() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    let deadline = Timestamp(1);
    clock.arm(&room("R1"), deadline);

    let expiry = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("should fire within the slack")
        .unwrap();
    assert_eq!(expiry.deadline, deadline);
}

#[tokio::test(start_paused = true)]
async fn test_rooms_fire_independently_in_deadline_order() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    clock.arm(&room("LATE"), in_secs(30));
    clock.arm(&room("EARLY"), in_secs(10));
    assert_eq!(clock.pending_count(), 2);

    assert_eq!(rx.recv().await.unwrap().room, room("EARLY"));
    assert_eq!(rx.recv().await.unwrap().room, room("LATE"));
}

// =========================================================================
// Replacing and cancelling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_previous_timer() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    let code = room("R1");
    let first = in_secs(10);
    let second = in_secs(20);

    clock.arm(&code, first);
    clock.arm(&code, second);
    assert_eq!(clock.pending_count(), 1);
    assert_eq!(clock.pending(&code), Some(second));

    let expiry = rx.recv().await.unwrap();
    assert_eq!(expiry.deadline, second);

    // The first timer never reports.
    assert!(timeout(Duration::from_secs(120), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_disarm_cancels_timer() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    let code = room("R1");
    clock.arm(&code, in_secs(5));

    assert!(clock.disarm(&code));
    assert!(!clock.disarm(&code));
    assert_eq!(clock.pending(&code), None);

    assert!(timeout(Duration::from_secs(60), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_disarm_all() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    clock.arm(&room("A"), in_secs(5));
    clock.arm(&room("B"), in_secs(6));

    clock.disarm_all();
    assert_eq!(clock.pending_count(), 0);
    assert!(timeout(Duration::from_secs(60), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_timers() {
    let (clock, mut rx) = TurnClock::new(ClockConfig::default());
    let other = clock.clone();
    let code = room("R1");

    clock.arm(&code, in_secs(10));
    assert_eq!(other.pending_count(), 1);
    assert!(other.disarm(&code));

    assert!(timeout(Duration::from_secs(60), rx.recv()).await.is_err());
}
