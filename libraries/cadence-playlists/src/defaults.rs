//! Built-in smart playlists

use cadence_core::{CreatePlaylist, Playlist, PlaylistStore, Result, SmartRule, SmartType};
use tracing::info;

const DEFAULT_DESCRIPTION: &str = "Auto-generated smart playlist";

/// Name and type of every built-in smart playlist
pub const DEFAULT_SMART_PLAYLISTS: [(&str, SmartType); 3] = [
    ("Favorites", SmartType::Favorites),
    ("Recently Added", SmartType::Recent),
    ("Most Played", SmartType::MostPlayed),
];

/// Create the built-in smart playlists whose names are not taken yet
///
/// Returns the playlists created by this call.
pub async fn ensure_default_playlists(store: &dyn PlaylistStore) -> Result<Vec<Playlist>> {
    let mut created = Vec::new();
    for (name, smart_type) in DEFAULT_SMART_PLAYLISTS {
        if store.find_by_name(name).await?.is_some() {
            continue;
        }

        let playlist = store
            .create_playlist(
                CreatePlaylist::smart(name, SmartRule::new(smart_type))
                    .with_description(DEFAULT_DESCRIPTION),
            )
            .await?;
        info!(playlist_id = playlist.id.get(), name, "Created default smart playlist");
        created.push(playlist);
    }
    Ok(created)
}
