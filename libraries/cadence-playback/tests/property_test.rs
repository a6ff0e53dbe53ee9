//! Property-based tests for the queue and playback manager
//!
//! Uses proptest to verify invariants across many random inputs.

mod common;

use cadence_playback::{EngineStatus, Queue, RepeatMode};
use common::*;
use proptest::prelude::*;

// ===== Helpers =====

#[derive(Debug, Clone)]
enum QueueOp {
    Next,
    Previous,
    Move(usize, usize),
    Remove(usize),
    Append,
    ToggleShuffle,
}

fn queue_op() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        3 => Just(QueueOp::Next),
        3 => Just(QueueOp::Previous),
        3 => (0usize..60, 0usize..60).prop_map(|(from, to)| QueueOp::Move(from, to)),
        1 => (0usize..60).prop_map(QueueOp::Remove),
        1 => Just(QueueOp::Append),
        1 => Just(QueueOp::ToggleShuffle),
    ]
}

fn sorted_ids(queue: &Queue) -> Vec<i64> {
    let mut ids: Vec<i64> = queue.tracks().iter().map(|t| t.id.get()).collect();
    ids.sort_unstable();
    ids
}

fn assert_cursor_invariant(queue: &Queue) -> Result<(), TestCaseError> {
    match queue.cursor() {
        Some(cursor) => prop_assert!(cursor < queue.len()),
        None => prop_assert!(queue.is_empty()),
    }
    Ok(())
}

// ===== Property Tests =====

proptest! {
    /// Property: the cursor never leaves `[0, len)` and is unset only when empty
    #[test]
    fn cursor_stays_in_bounds(
        len in 1i64..40,
        start in 0usize..40,
        seed in any::<u64>(),
        ops in prop::collection::vec(queue_op(), 0..200)
    ) {
        let mut queue = Queue::with_seed(seed);
        let tracks = create_tracks(len);
        let start = start % tracks.len();
        queue.load(tracks, start).unwrap();

        let mut next_id = len + 1;
        for op in ops {
            match op {
                QueueOp::Next => { queue.next(); }
                QueueOp::Previous => { queue.previous(); }
                QueueOp::Move(from, to) => { let _ = queue.move_item(from, to); }
                QueueOp::Remove(index) => { let _ = queue.remove(index); }
                QueueOp::Append => {
                    queue.append(create_track(next_id));
                    next_id += 1;
                }
                QueueOp::ToggleShuffle => queue.set_shuffle(!queue.shuffle()),
            }
            assert_cursor_invariant(&queue)?;
        }
    }

    /// Property: moves preserve the multiset of track ids and the current track
    #[test]
    fn move_preserves_tracks(
        len in 1i64..40,
        start in 0usize..40,
        moves in prop::collection::vec((0usize..40, 0usize..40), 1..100)
    ) {
        let mut queue = Queue::with_seed(1);
        let tracks = create_tracks(len);
        let start = start % tracks.len();
        queue.load(tracks, start).unwrap();

        let before = sorted_ids(&queue);
        let current = queue.current().map(|t| t.id);

        for (from, to) in moves {
            let len = queue.len();
            let result = queue.move_item(from, to);
            prop_assert_eq!(result.is_ok(), from < len && to < len);
        }

        prop_assert_eq!(sorted_ids(&queue), before);
        prop_assert_eq!(queue.current().map(|t| t.id), current);
    }

    /// Property: sequential next visits every slot once per lap
    #[test]
    fn sequential_next_is_cyclic(len in 1i64..30, start in 0usize..30) {
        let mut queue = Queue::new();
        let tracks = create_tracks(len);
        let start = start % tracks.len();
        queue.load(tracks, start).unwrap();

        let mut visited = Vec::new();
        for _ in 0..len {
            queue.next();
            visited.push(queue.cursor().unwrap());
        }
        visited.sort_unstable();
        prop_assert_eq!(visited, (0..len as usize).collect::<Vec<_>>());
        prop_assert_eq!(queue.cursor(), Some(start));
    }

    /// Property: with repeat off, natural completion plays each remaining
    /// track exactly once and then stops on the last one
    #[test]
    fn completion_runs_to_end_of_queue(len in 1i64..20, start in 0usize..20) {
        let mut h = Harness::new();
        let start = start % len as usize;
        h.manager.play_queue(create_tracks(len), start).unwrap();
        h.manager.set_repeat(RepeatMode::Off);

        for expected in start + 1..len as usize {
            h.manager.on_engine_status(EngineStatus::Ended).unwrap();
            prop_assert_eq!(h.manager.cursor_index(), expected as i64);
        }
        h.manager.on_engine_status(EngineStatus::Ended).unwrap();

        prop_assert_eq!(h.manager.get_state(), cadence_playback::PlaybackState::Stopped);
        prop_assert_eq!(h.manager.cursor_index(), len - 1);
    }
}
