//! Queue / playlist boundary
//!
//! The live queue never aliases stored membership. Loading copies tracks out
//! of a playlist; saving writes a queue's order into a new manual playlist.

use cadence_core::{CreatePlaylist, Playlist, PlaylistId, PlaylistStore, Result, Track, TrackId};
use tracing::{info, warn};

/// Member tracks of a playlist in position order, as owned values
pub async fn playlist_snapshot(store: &dyn PlaylistStore, id: PlaylistId) -> Result<Vec<Track>> {
    store.tracks(id).await
}

/// Create a manual playlist holding exactly `tracks`, in order
///
/// The playlist is removed again if its items cannot be written.
pub async fn save_queue_as_playlist(
    store: &dyn PlaylistStore,
    name: &str,
    tracks: &[Track],
) -> Result<Playlist> {
    let playlist = store.create_playlist(CreatePlaylist::manual(name)).await?;
    let ids: Vec<TrackId> = tracks.iter().map(|t| t.id).collect();

    if let Err(e) = store.replace_items(playlist.id, &ids).await {
        if let Err(cleanup) = store.delete_playlist(playlist.id).await {
            warn!(playlist_id = playlist.id.get(), error = %cleanup, "Failed to remove partial playlist");
        }
        return Err(e);
    }

    info!(playlist_id = playlist.id.get(), name, tracks = ids.len(), "Saved queue as playlist");
    store.get_playlist(playlist.id).await
}
