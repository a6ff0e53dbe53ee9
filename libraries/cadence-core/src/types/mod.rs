mod ids;
mod playlist;
mod query;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use playlist::{
    CreatePlaylist, Playlist, PlaylistItem, PlaylistKind, PlaylistStats, PlaylistTotals,
    SmartRule, SmartType, DEFAULT_REFRESH_INTERVAL_HOURS,
};
pub use query::{TrackFilter, TrackQuery, TrackSort};
pub use track::{MediaLocator, NewTrack, Track, TrackUpdate, MAX_RATING};
