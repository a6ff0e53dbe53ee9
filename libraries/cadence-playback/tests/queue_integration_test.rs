//! Queue management integration tests
//!
//! Real-world scenarios: playing from a playlist, queueing tracks while
//! something plays, shuffle with a fixed seed.

mod common;

use cadence_playback::{PlaybackConfig, PlaybackEvent, PlaybackState, Queue, RepeatMode};
use common::*;

fn queue_ids(h: &Harness) -> Vec<i64> {
    h.manager.get_queue().iter().map(|t| t.id.get()).collect()
}

// ===== Queue Creation Tests =====

#[test]
fn test_play_from_playlist_position() {
    let mut h = Harness::new();

    // User taps the third track of a five-track playlist
    h.manager.play_queue(create_tracks(5), 2).unwrap();

    assert_eq!(queue_ids(&h), vec![1, 2, 3, 4, 5]);
    assert_eq!(h.manager.cursor_index(), 2);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(3));
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
}

#[test]
fn test_load_rejects_empty_and_bad_start() {
    let mut h = Harness::new();
    assert!(h.manager.load(Vec::new(), 0).is_err());
    assert!(h.manager.load(create_tracks(2), 2).is_err());
    assert_eq!(h.manager.cursor_index(), -1);
    assert!(h.engine.calls().is_empty());
}

#[test]
fn test_reload_replaces_queue_while_playing() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();
    h.engine.clear_calls();

    h.manager.load(vec![create_track(10), create_track(11)], 1).unwrap();

    assert_eq!(queue_ids(&h), vec![10, 11]);
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Load(locator(11)), EngineCall::Play]
    );
}

// ===== Queue Mutation Tests =====

#[test]
fn test_add_next_goes_after_current() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();

    h.manager.add_next(create_track(9)).unwrap();
    h.manager.next().unwrap();

    assert_eq!(queue_ids(&h), vec![1, 9, 2, 3]);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(9));
}

#[test]
fn test_add_to_queue_appends_and_reports_length() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(2), 0).unwrap();
    h.manager.drain_events();

    h.manager.add_to_queue(create_track(7)).unwrap();

    assert_eq!(queue_ids(&h), vec![1, 2, 7]);
    assert_eq!(h.manager.cursor_index(), 0);
    assert!(h
        .manager
        .drain_events()
        .contains(&PlaybackEvent::QueueChanged { length: 3 }));
}

#[test]
fn test_same_track_can_be_queued_twice() {
    let mut h = Harness::new();
    h.manager.load(vec![create_track(1)], 0).unwrap();
    h.manager.add_to_queue(create_track(1)).unwrap();

    h.manager.next().unwrap();
    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(queue_ids(&h), vec![1, 1]);
}

#[test]
fn test_clear_queue_then_add_prepares_nothing_until_play() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(2), 0).unwrap();
    h.manager.clear_queue().unwrap();
    h.engine.clear_calls();

    h.manager.add_to_queue(create_track(4)).unwrap();
    assert!(h.engine.calls().is_empty());
    assert_eq!(h.manager.cursor_index(), 0);

    h.manager.play().unwrap();
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Load(locator(4)), EngineCall::Play]
    );
}

// ===== Shuffle & Repeat Tests =====

#[test]
fn test_seeded_shuffle_is_reproducible() {
    let config = PlaybackConfig {
        shuffle: true,
        shuffle_seed: Some(42),
        ..Default::default()
    };

    let walk = |config: PlaybackConfig| {
        let mut h = Harness::with_config(config);
        h.manager.load(create_tracks(10), 0).unwrap();
        (0..20)
            .map(|_| {
                h.manager.next().unwrap();
                h.manager.cursor_index()
            })
            .collect::<Vec<_>>()
    };

    let first = walk(config.clone());
    assert_eq!(first, walk(config));
    assert!(first.iter().all(|c| (0..10).contains(c)));
}

#[test]
fn test_config_seeds_shuffle_and_repeat() {
    let h = Harness::with_config(PlaybackConfig {
        shuffle: true,
        repeat: RepeatMode::All,
        ..Default::default()
    });
    assert!(h.manager.get_shuffle());
    assert_eq!(h.manager.get_repeat(), RepeatMode::All);
}

#[test]
fn test_repeat_does_not_affect_explicit_next() {
    let mut queue = Queue::new();
    queue.load(create_tracks(2), 1).unwrap();
    queue.set_repeat(RepeatMode::Off);

    queue.next();
    assert_eq!(queue.cursor(), Some(0));
}
