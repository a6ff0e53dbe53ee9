//! Play queue
//!
//! An ordered list of tracks with a cursor. Navigation wraps in both
//! directions; in shuffle mode every step picks a uniformly random slot,
//! which may be the current one.
//!
//! Invariant: the cursor is `Some(i)` with `i < len`, or `None` exactly when
//! the queue is empty.

use crate::error::{PlaybackError, Result};
use crate::types::{QueueChange, RepeatMode};
use cadence_core::Track;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    rng: StdRng,
    changes: Vec<QueueChange>,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty queue whose shuffle sequence is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            cursor: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            rng,
            changes: Vec::new(),
        }
    }

    /// Replace the queue wholesale and select `start_index`
    pub fn load(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(PlaybackError::invalid_argument("cannot load an empty queue"));
        }
        if start_index >= tracks.len() {
            return Err(PlaybackError::invalid_argument(format!(
                "start index {} past end of {} tracks",
                start_index,
                tracks.len()
            )));
        }

        self.tracks = tracks;
        self.select_unchecked(start_index);
        Ok(())
    }

    /// Advance the cursor
    ///
    /// Wraps from the last slot to the first regardless of repeat mode.
    /// Returns `None` on an empty queue.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Track> {
        let len = self.tracks.len();
        let cursor = self.cursor?;
        let index = if self.shuffle {
            self.rng.gen_range(0..len)
        } else {
            (cursor + 1) % len
        };
        self.select_unchecked(index);
        self.current()
    }

    /// Step the cursor back, wrapping from the first slot to the last
    pub fn previous(&mut self) -> Option<&Track> {
        let len = self.tracks.len();
        let cursor = self.cursor?;
        let index = if self.shuffle {
            self.rng.gen_range(0..len)
        } else {
            (cursor + len - 1) % len
        };
        self.select_unchecked(index);
        self.current()
    }

    /// Select an arbitrary slot
    pub fn select(&mut self, index: usize) -> Result<&Track> {
        self.check_index(index)?;
        self.select_unchecked(index);
        self.current().ok_or(PlaybackError::NoTrackLoaded)
    }

    fn select_unchecked(&mut self, index: usize) {
        self.cursor = Some(index);
        self.changes.push(QueueChange::TrackChanged {
            index,
            track_id: self.tracks[index].id,
        });
    }

    /// Move the slot at `from` to `to`
    ///
    /// The cursor keeps pointing at the same logical track.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        if let Some(cursor) = self.cursor {
            self.cursor = Some(if cursor == from {
                to
            } else if from < cursor && to >= cursor {
                cursor - 1
            } else if from > cursor && to <= cursor {
                cursor + 1
            } else {
                cursor
            });
        }

        self.changes.push(QueueChange::Reordered { from, to });
        Ok(())
    }

    /// Add a track at the end
    pub fn append(&mut self, track: Track) {
        let index = self.tracks.len();
        self.tracks.push(track);
        self.changes.push(QueueChange::Inserted { index });
        if self.cursor.is_none() {
            self.select_unchecked(0);
        }
    }

    /// Add a track right after the cursor
    pub fn insert_next(&mut self, track: Track) {
        let index = self.cursor.map_or(0, |cursor| cursor + 1);
        self.tracks.insert(index, track);
        self.changes.push(QueueChange::Inserted { index });
        if self.cursor.is_none() {
            self.select_unchecked(0);
        }
    }

    /// Remove the slot at `index`
    ///
    /// Removing the selected slot selects whatever now occupies that index,
    /// or the new last slot when the tail was removed.
    pub fn remove(&mut self, index: usize) -> Result<Track> {
        self.check_index(index)?;

        let removed = self.tracks.remove(index);
        self.changes.push(QueueChange::Removed { index });

        let cursor = self.cursor;
        match cursor {
            _ if self.tracks.is_empty() => {
                self.cursor = None;
                self.changes.push(QueueChange::Cleared);
            }
            Some(cursor) if index < cursor => self.cursor = Some(cursor - 1),
            Some(cursor) if index == cursor => {
                self.select_unchecked(cursor.min(self.tracks.len() - 1));
            }
            _ => {}
        }

        Ok(removed)
    }

    /// Remove every track
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = None;
        self.changes.push(QueueChange::Cleared);
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|index| self.tracks.get(index))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor with -1 for "no selection"
    pub fn cursor_index(&self) -> i64 {
        self.cursor.map_or(-1, |index| index as i64)
    }

    pub fn is_at_last(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 == self.tracks.len())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    /// Take the changes recorded since the last drain
    pub fn drain_changes(&mut self) -> Vec<QueueChange> {
        std::mem::take(&mut self.changes)
    }

    /// Put the cursor back without recording a change
    pub(crate) fn restore_cursor(&mut self, cursor: Option<usize>) {
        if let Some(index) = cursor.filter(|index| *index < self.tracks.len()) {
            self.cursor = Some(index);
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::OutOfRange {
                index,
                len: self.tracks.len(),
            });
        }
        Ok(())
    }
}
