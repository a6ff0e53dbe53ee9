//! Playback state machine tests
//!
//! Drives the manager through engine callbacks, interruptions and user
//! commands against a recording engine.

mod common;

use cadence_playback::{
    CallState, EngineStatus, FocusChange, InterruptReason, PlaybackConfig, PlaybackEngine,
    PlaybackError, PlaybackEvent, PlaybackState, RepeatMode,
};
use cadence_core::TrackId;
use common::*;
use std::time::Duration;

fn seeks(events: &[PlaybackEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::SeekIssued { position_ms } => Some(*position_ms),
            _ => None,
        })
        .collect()
}

// ===== Natural Completion =====

#[test]
fn test_repeat_one_restarts_current_track() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 1).unwrap();
    h.manager.set_repeat(RepeatMode::One);
    h.manager.drain_events();
    h.engine.clear_calls();

    h.manager.on_engine_status(EngineStatus::Ended).unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Seek(Duration::ZERO), EngineCall::Play]
    );

    let events = h.manager.drain_events();
    assert!(events.contains(&PlaybackEvent::TrackFinished {
        track_id: TrackId::new(2)
    }));
    assert_eq!(seeks(&events), vec![0]);
}

#[test]
fn test_repeat_off_at_last_track_stops() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 2).unwrap();

    h.manager.on_engine_status(EngineStatus::Ended).unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Stopped);
    assert_eq!(h.manager.cursor_index(), 2);
    assert!(h.manager.get_current_track().is_none());
    assert!(!h.focus.is_held());
}

#[test]
fn test_repeat_off_mid_queue_advances() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();
    h.engine.clear_calls();

    h.manager.on_engine_status(EngineStatus::Ended).unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Load(locator(2)), EngineCall::Play]
    );
}

#[test]
fn test_repeat_all_wraps_to_first_track() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 2).unwrap();
    h.manager.set_repeat(RepeatMode::All);

    h.manager.on_engine_status(EngineStatus::Ended).unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert_eq!(h.manager.cursor_index(), 0);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(1));
}

#[test]
fn test_end_of_media_ignored_when_paused() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();
    h.manager.pause().unwrap();
    h.manager.drain_events();

    h.manager.on_engine_status(EngineStatus::Ended).unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert_eq!(h.manager.cursor_index(), 0);
    assert!(h.manager.drain_events().is_empty());
}

// ===== Previous =====

#[test]
fn test_previous_past_threshold_restarts_track() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 1).unwrap();
    h.manager.drain_events();
    h.engine.clear_calls();
    h.engine.set_position_ms(5000);

    h.manager.previous().unwrap();

    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(h.engine.calls(), vec![EngineCall::Seek(Duration::ZERO)]);
    assert_eq!(seeks(&h.manager.drain_events()), vec![0]);
}

#[test]
fn test_previous_within_threshold_steps_back_and_wraps() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 1).unwrap();
    h.engine.set_position_ms(1000);

    h.manager.previous().unwrap();
    assert_eq!(h.manager.cursor_index(), 0);

    h.manager.previous().unwrap();
    assert_eq!(h.manager.cursor_index(), 2);
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
}

#[test]
fn test_restart_threshold_is_configurable() {
    let mut h = Harness::with_config(PlaybackConfig {
        restart_threshold_ms: 10_000,
        ..Default::default()
    });
    h.manager.play_queue(create_tracks(3), 1).unwrap();
    h.engine.set_position_ms(5000);

    h.manager.previous().unwrap();
    assert_eq!(h.manager.cursor_index(), 0);
}

// ===== Next =====

#[test]
fn test_next_three_times_wraps() {
    let mut h = Harness::new();
    h.manager.load(create_tracks(3), 0).unwrap();

    let mut cursors = Vec::new();
    for _ in 0..3 {
        h.manager.next().unwrap();
        cursors.push(h.manager.cursor_index());
    }
    assert_eq!(cursors, vec![1, 2, 0]);
}

#[test]
fn test_next_while_paused_loads_without_playing() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();
    h.manager.pause().unwrap();
    h.engine.clear_calls();

    h.manager.next().unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert_eq!(h.engine.calls(), vec![EngineCall::Load(locator(2))]);
}

#[test]
fn test_next_emits_track_changed() {
    let mut h = Harness::new();
    h.manager.load(create_tracks(2), 0).unwrap();
    h.manager.drain_events();

    h.manager.next().unwrap();

    let events = h.manager.drain_events();
    assert_eq!(
        events[0],
        PlaybackEvent::TrackChanged {
            index: 1,
            track_id: TrackId::new(2)
        }
    );
    let snapshot = events.last().and_then(|e| e.snapshot()).unwrap();
    assert_eq!(snapshot.cursor, 1);
}

#[test]
fn test_navigation_on_empty_queue_is_noop() {
    let mut h = Harness::new();
    h.manager.next().unwrap();
    h.manager.previous().unwrap();
    assert_eq!(h.manager.cursor_index(), -1);
    assert!(!h.manager.has_pending_events());
}

#[test]
fn test_failed_load_keeps_cursor() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();
    h.manager.drain_events();
    h.engine.fail_loads(true);

    let result = h.manager.next();

    assert!(matches!(result, Err(PlaybackError::Engine(_))));
    assert_eq!(h.manager.cursor_index(), 0);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(1));
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert!(h.manager.drain_events().is_empty());
}

#[test]
fn test_failed_play_on_next_restores_previous_track() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 0).unwrap();
    h.engine.set_position_ms(42_000);
    h.manager.drain_events();
    h.engine.fail_plays(true);

    let result = h.manager.next();

    assert!(matches!(result, Err(PlaybackError::Engine(_))));
    assert_eq!(h.manager.cursor_index(), 0);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(1));
    assert_eq!(h.engine.loaded(), Some(locator(1)));
    assert_eq!(h.engine.position(), Duration::from_millis(42_000));
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert!(h.manager.drain_events().is_empty());

    h.engine.fail_plays(false);
    h.manager.next().unwrap();
    assert_eq!(h.engine.loaded(), Some(locator(2)));
}

#[test]
fn test_failed_play_after_stop_leaves_nothing_prepared() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(2), 1).unwrap();
    h.manager.stop().unwrap();
    h.engine.fail_plays(true);

    assert!(h.manager.play().is_err());

    assert_eq!(h.manager.get_state(), PlaybackState::Stopped);
    assert!(h.manager.get_current_track().is_none());
    assert!(!h.focus.is_held());
    assert_eq!(h.engine.calls().last(), Some(&EngineCall::Stop));
}

// ===== Play / Pause / Stop =====

#[test]
fn test_play_without_queue_fails() {
    let mut h = Harness::new();
    assert!(matches!(h.manager.play(), Err(PlaybackError::NoTrackLoaded)));
}

#[test]
fn test_play_denied_is_silent_noop() {
    let mut h = Harness::new();
    h.manager.load(create_tracks(2), 0).unwrap();
    h.manager.drain_events();
    h.focus.set_blocked(true);

    h.manager.play().unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Idle);
    assert!(!h.engine.calls().contains(&EngineCall::Play));
    assert!(!h.manager.has_pending_events());
}

#[test]
fn test_pause_releases_focus() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();
    assert!(h.focus.is_held());

    h.manager.pause().unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert!(!h.focus.is_held());

    h.manager.play().unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
}

#[test]
fn test_stop_clears_now_playing_but_keeps_queue() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 1).unwrap();

    h.manager.stop().unwrap();

    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Stopped);
    assert!(snapshot.track.is_none());
    assert_eq!(snapshot.cursor, 1);
    assert_eq!(snapshot.queue_length, 3);
    assert_eq!(snapshot.position_ms, 0);
}

#[test]
fn test_play_after_stop_reprepares_track() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 1).unwrap();
    h.manager.stop().unwrap();
    h.engine.clear_calls();

    h.manager.play().unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Load(locator(2)), EngineCall::Play]
    );
}

#[test]
fn test_toggle_playback_alternates() {
    let mut h = Harness::new();
    h.manager.load(create_tracks(2), 0).unwrap();

    h.manager.toggle_playback().unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);

    h.manager.toggle_playback().unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert!(!h.focus.is_held());

    h.manager.toggle_playback().unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
}

#[test]
fn test_toggle_playback_without_track_fails() {
    let mut h = Harness::new();
    assert!(matches!(
        h.manager.toggle_playback(),
        Err(PlaybackError::NoTrackLoaded)
    ));
}

#[test]
fn test_poll_engine_delivers_idle_without_tick() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();
    h.manager.stop().unwrap();
    h.engine.push_status(EngineStatus::Idle);
    h.manager.drain_events();

    h.manager.poll_engine().unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Idle);
    // Polling never reports a position
    assert!(!h
        .manager
        .drain_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::PositionUpdate { .. })));
}

#[test]
fn test_engine_idle_after_stop_returns_to_idle() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();

    h.manager.on_engine_status(EngineStatus::Idle).unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);

    h.manager.stop().unwrap();
    h.manager.on_engine_status(EngineStatus::Idle).unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Idle);
}

// ===== Interruptions =====

#[test]
fn test_focus_loss_pauses_without_auto_resume() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(2), 0).unwrap();
    h.manager.drain_events();

    h.manager
        .on_focus_change(FocusChange::LostTransient)
        .unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert!(h.manager.drain_events().contains(&PlaybackEvent::Interrupted {
        reason: InterruptReason::FocusLost
    }));

    h.engine.clear_calls();
    h.manager.on_focus_change(FocusChange::Gained).unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert!(h.engine.calls().is_empty());
}

#[test]
fn test_duckable_loss_also_pauses() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();

    h.manager
        .on_focus_change(FocusChange::LostTransientCanDuck)
        .unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
}

#[test]
fn test_phone_call_pauses() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();
    h.manager.drain_events();

    h.manager.on_call_state(CallState::Ringing).unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
    assert!(h.manager.drain_events().contains(&PlaybackEvent::Interrupted {
        reason: InterruptReason::PhoneCall
    }));

    h.manager.on_call_state(CallState::Idle).unwrap();
    assert_eq!(h.manager.get_state(), PlaybackState::Paused);
}

#[test]
fn test_interruption_while_paused_is_ignored() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();
    h.manager.pause().unwrap();
    h.manager.drain_events();

    h.manager
        .on_focus_change(FocusChange::LostPermanent)
        .unwrap();
    assert!(!h.manager.has_pending_events());
}

// ===== Seek & Speed =====

#[test]
fn test_set_speed_range() {
    let mut h = Harness::new();
    h.manager.load(create_tracks(1), 0).unwrap();

    assert!(matches!(
        h.manager.set_speed(0.1),
        Err(PlaybackError::InvalidArgument(_))
    ));
    assert!(matches!(
        h.manager.set_speed(4.5),
        Err(PlaybackError::InvalidArgument(_))
    ));
    assert!(h.manager.set_speed(f32::NAN).is_err());
    assert_eq!(h.manager.get_speed(), 1.0);

    h.manager.set_speed(2.0).unwrap();
    assert_eq!(h.manager.get_speed(), 2.0);
    assert!(h.engine.calls().contains(&EngineCall::SetSpeed(2.0)));

    h.manager.set_speed(0.25).unwrap();
    h.manager.set_speed(4.0).unwrap();
}

#[test]
fn test_seek_requires_track_and_clamps() {
    let mut h = Harness::new();
    assert!(matches!(
        h.manager.seek(Duration::from_secs(1)),
        Err(PlaybackError::NoTrackLoaded)
    ));

    h.manager.load(create_tracks(1), 0).unwrap();
    h.manager.drain_events();
    h.manager.seek(Duration::from_secs(600)).unwrap();

    assert_eq!(h.manager.get_position(), Duration::from_millis(180_000));
    assert_eq!(seeks(&h.manager.drain_events()), vec![180_000]);
}

// ===== Bookmarks =====

#[test]
fn test_bookmark_resume_on_prepare() {
    let mut h = Harness::new();
    let mut track = create_track(1);
    track.bookmark_ms = 42_000;

    h.manager.load(vec![track], 0).unwrap();

    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::Load(locator(1)),
            EngineCall::Seek(Duration::from_millis(42_000))
        ]
    );
}

#[test]
fn test_bookmark_resume_can_be_disabled() {
    let mut h = Harness::with_config(PlaybackConfig {
        resume_from_bookmark: false,
        ..Default::default()
    });
    let mut track = create_track(1);
    track.bookmark_ms = 42_000;

    h.manager.load(vec![track], 0).unwrap();

    assert_eq!(h.engine.calls(), vec![EngineCall::Load(locator(1))]);
}

// ===== Tick =====

#[test]
fn test_tick_reports_position_while_playing() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(2), 0).unwrap();
    h.manager.drain_events();
    h.engine.set_position_ms(12_000);

    h.manager.tick().unwrap();
    assert_eq!(
        h.manager.drain_events(),
        vec![PlaybackEvent::PositionUpdate {
            position_ms: 12_000,
            duration_ms: 180_000
        }]
    );

    h.manager.pause().unwrap();
    h.manager.drain_events();
    h.manager.tick().unwrap();
    assert!(!h.manager.has_pending_events());
}

#[test]
fn test_tick_handles_pending_end_of_media() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(2), 0).unwrap();
    h.engine.push_status(EngineStatus::Buffering);
    h.engine.push_status(EngineStatus::Ended);

    h.manager.tick().unwrap();

    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
}

// ===== Queue Mutation While Playing =====

#[test]
fn test_remove_current_track_prepares_successor() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 1).unwrap();
    h.engine.clear_calls();

    let removed = h.manager.remove_from_queue(1).unwrap();

    assert_eq!(removed.id.get(), 2);
    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(3));
    assert_eq!(h.manager.get_state(), PlaybackState::Playing);
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Load(locator(3)), EngineCall::Play]
    );
}

#[test]
fn test_remove_other_track_keeps_engine_untouched() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(3), 2).unwrap();
    h.engine.clear_calls();

    h.manager.remove_from_queue(0).unwrap();

    assert_eq!(h.manager.cursor_index(), 1);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(3));
    assert!(h.engine.calls().is_empty());
}

#[test]
fn test_remove_only_track_stops() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(1), 0).unwrap();

    h.manager.remove_from_queue(0).unwrap();

    assert_eq!(h.manager.get_state(), PlaybackState::Stopped);
    assert_eq!(h.manager.cursor_index(), -1);
    assert!(h.manager.get_current_track().is_none());
}

#[test]
fn test_move_item_keeps_current_track() {
    let mut h = Harness::new();
    h.manager.play_queue(create_tracks(4), 1).unwrap();
    h.manager.drain_events();

    h.manager.move_item(1, 3).unwrap();

    assert_eq!(h.manager.cursor_index(), 3);
    assert_eq!(h.manager.get_current_track().map(|t| t.id.get()), Some(2));
    assert!(h
        .manager
        .drain_events()
        .contains(&PlaybackEvent::QueueChanged { length: 4 }));
}

#[test]
fn test_jump_to_out_of_range() {
    let mut h = Harness::new();
    h.manager.load(create_tracks(2), 0).unwrap();
    assert!(matches!(
        h.manager.jump_to(5),
        Err(PlaybackError::OutOfRange { index: 5, len: 2 })
    ));

    h.manager.jump_to(1).unwrap();
    assert_eq!(h.manager.cursor_index(), 1);
}
