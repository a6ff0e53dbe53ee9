use crate::time::{from_millis, now_millis, to_millis};
use cadence_core::{
    error::Result,
    types::{MediaLocator, NewTrack, PlaylistId, Track, TrackFilter, TrackId, TrackQuery, TrackUpdate},
    CadenceError,
};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

/// Track columns, qualified so they can be selected through joins
pub(crate) const TRACK_COLUMNS: &str = r#"
    tracks.id AS id, tracks.title AS title, tracks.artist AS artist,
    tracks.album AS album, tracks.genre AS genre, tracks.track_number AS track_number,
    tracks.year AS year, tracks.duration_ms AS duration_ms,
    tracks.play_count AS play_count, tracks.favorite AS favorite,
    tracks.rating AS rating, tracks.bookmark_ms AS bookmark_ms,
    tracks.local_path AS local_path, tracks.stream_url AS stream_url,
    tracks.added_at AS added_at, tracks.last_played AS last_played
"#;

pub(crate) fn track_from_row(row: &SqliteRow) -> Result<Track> {
    let locator = MediaLocator::from_parts(row.try_get("local_path")?, row.try_get("stream_url")?)?;

    Ok(Track {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        album: row.try_get("album")?,
        genre: row.try_get("genre")?,
        track_number: row.try_get::<Option<i64>, _>("track_number")?.map(|n| n as u32),
        year: row.try_get::<Option<i64>, _>("year")?.map(|y| y as u32),
        duration_ms: row.try_get::<i64, _>("duration_ms")? as u64,
        play_count: row.try_get::<i64, _>("play_count")? as u32,
        favorite: row.try_get::<i64, _>("favorite")? != 0,
        rating: row.try_get::<i64, _>("rating")? as u8,
        bookmark_ms: row.try_get::<i64, _>("bookmark_ms")? as u64,
        locator,
        added_at: from_millis(row.try_get("added_at")?),
        last_played: row.try_get::<Option<i64>, _>("last_played")?.map(from_millis),
    })
}

/// Append `filter` as `AND` clauses to a query that already has a `WHERE`
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TrackFilter) {
    if let Some(favorite) = filter.favorite {
        builder.push(" AND favorite = ").push_bind(i64::from(favorite));
    }
    if let Some(min_rating) = filter.min_rating {
        builder.push(" AND rating >= ").push_bind(i64::from(min_rating));
    }
    if let Some(min_play_count) = filter.min_play_count {
        builder.push(" AND play_count >= ").push_bind(i64::from(min_play_count));
    }
    if let Some(genre) = &filter.genre {
        builder.push(" AND genre = ").push_bind(genre.clone()).push(" COLLATE NOCASE");
    }
    if let Some(artist) = &filter.artist {
        builder.push(" AND artist = ").push_bind(artist.clone()).push(" COLLATE NOCASE");
    }
    if let Some(text) = &filter.text {
        let pattern = format!("%{}%", text);
        builder
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR artist LIKE ")
            .push_bind(pattern.clone())
            .push(" OR album LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Get track by ID
pub async fn get_by_id(pool: &SqlitePool, id: TrackId) -> Result<Option<Track>> {
    let row = sqlx::query(&format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(track_from_row).transpose()
}

/// Filtered, sorted scan
pub async fn query(pool: &SqlitePool, query: &TrackQuery) -> Result<Vec<Track>> {
    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM tracks WHERE 1 = 1", TRACK_COLUMNS));
    push_filter(&mut builder, &query.filter);
    builder.push(" ORDER BY ").push(query.sort.order_by());
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ").push_bind(i64::from(limit));
    }

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(track_from_row).collect()
}

/// Count tracks matching a filter
pub async fn count(pool: &SqlitePool, filter: &TrackFilter) -> Result<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS n FROM tracks WHERE 1 = 1");
    push_filter(&mut builder, filter);

    let row = builder.build().fetch_one(pool).await?;
    Ok(row.try_get::<i64, _>("n")? as u64)
}

/// Summed duration of tracks matching a filter
pub async fn total_duration(pool: &SqlitePool, filter: &TrackFilter) -> Result<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COALESCE(SUM(duration_ms), 0) AS total FROM tracks WHERE 1 = 1",
    );
    push_filter(&mut builder, filter);

    let row = builder.build().fetch_one(pool).await?;
    Ok(row.try_get::<i64, _>("total")? as u64)
}

/// Create track
pub async fn create(pool: &SqlitePool, track: NewTrack) -> Result<Track> {
    track.validate()?;

    let (local_path, stream_url) = track.locator.to_parts();
    let added_at = track.added_at.map_or_else(now_millis, to_millis);

    let result = sqlx::query(
        r#"
        INSERT INTO tracks (
            title, artist, album, genre, track_number, year,
            duration_ms, favorite, rating, local_path, stream_url, added_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(&track.genre)
    .bind(track.track_number.map(i64::from))
    .bind(track.year.map(i64::from))
    .bind(track.duration_ms as i64)
    .bind(i64::from(track.favorite))
    .bind(i64::from(track.rating))
    .bind(local_path)
    .bind(stream_url)
    .bind(added_at)
    .execute(pool)
    .await?;

    let id = TrackId::new(result.last_insert_rowid());
    get_by_id(pool, id)
        .await?
        .ok_or_else(|| CadenceError::store("Failed to retrieve created track"))
}

/// Apply a single-field update
///
/// Bookmark and duration writes re-check their bound against the row being
/// written, so two concurrent updates cannot leave the bookmark past the end.
pub async fn update_field(pool: &SqlitePool, id: TrackId, update: TrackUpdate) -> Result<()> {
    let current = get_by_id(pool, id)
        .await?
        .ok_or_else(|| CadenceError::not_found("Track", id))?;
    update.validate(&current)?;

    let query = match &update {
        TrackUpdate::Title(title) => sqlx::query("UPDATE tracks SET title = ? WHERE id = ?")
            .bind(title.clone())
            .bind(id),
        TrackUpdate::Artist(artist) => sqlx::query("UPDATE tracks SET artist = ? WHERE id = ?")
            .bind(artist.clone())
            .bind(id),
        TrackUpdate::Album(album) => sqlx::query("UPDATE tracks SET album = ? WHERE id = ?")
            .bind(album.clone())
            .bind(id),
        TrackUpdate::Genre(genre) => sqlx::query("UPDATE tracks SET genre = ? WHERE id = ?")
            .bind(genre.clone())
            .bind(id),
        TrackUpdate::DurationMs(duration_ms) => sqlx::query(
            r#"
            UPDATE tracks SET duration_ms = ?
            WHERE id = ?
              AND (? = 0 OR bookmark_ms <= ?)
            "#,
        )
        .bind(*duration_ms as i64)
        .bind(id)
        .bind(*duration_ms as i64)
        .bind(*duration_ms as i64),
        TrackUpdate::Favorite(favorite) => sqlx::query("UPDATE tracks SET favorite = ? WHERE id = ?")
            .bind(i64::from(*favorite))
            .bind(id),
        TrackUpdate::Rating(rating) => sqlx::query("UPDATE tracks SET rating = ? WHERE id = ?")
            .bind(i64::from(*rating))
            .bind(id),
        TrackUpdate::BookmarkMs(bookmark_ms) => sqlx::query(
            r#"
            UPDATE tracks SET bookmark_ms = ?
            WHERE id = ?
              AND (duration_ms = 0 OR duration_ms >= ?)
            "#,
        )
        .bind(*bookmark_ms as i64)
        .bind(id)
        .bind(*bookmark_ms as i64),
        TrackUpdate::Locator(locator) => {
            let (local_path, stream_url) = locator.to_parts();
            sqlx::query("UPDATE tracks SET local_path = ?, stream_url = ? WHERE id = ?")
                .bind(local_path)
                .bind(stream_url)
                .bind(id)
        }
    };

    let result = query.execute(pool).await?;
    if result.rows_affected() == 0 {
        // Gone, or changed under us so the guarded bound no longer holds
        let current = get_by_id(pool, id)
            .await?
            .ok_or_else(|| CadenceError::not_found("Track", id))?;
        update.validate(&current)?;
        return Err(CadenceError::store(format!("track {} changed during update", id)));
    }

    Ok(())
}

/// Delete track
///
/// Playlist slots referencing the track are removed by the foreign key
/// cascade; the affected playlists are renumbered in the same transaction.
/// Returns the playlists whose membership changed.
pub async fn delete(pool: &SqlitePool, id: TrackId) -> Result<Vec<PlaylistId>> {
    let mut tx = pool.begin().await?;

    let affected: Vec<PlaylistId> =
        sqlx::query("SELECT DISTINCT playlist_id FROM playlist_items WHERE track_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|row| row.try_get::<PlaylistId, _>("playlist_id"))
            .collect::<std::result::Result<_, sqlx::Error>>()?;

    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CadenceError::not_found("Track", id));
    }

    for playlist_id in &affected {
        crate::playlists::renumber(&mut tx, *playlist_id).await?;
        crate::playlists::write_totals(&mut tx, *playlist_id).await?;
    }

    tx.commit().await?;
    Ok(affected)
}

/// Bump the play counter and stamp `last_played`
pub async fn increment_play_count(pool: &SqlitePool, id: TrackId) -> Result<()> {
    let result = sqlx::query(
        "UPDATE tracks SET play_count = play_count + 1, last_played = ? WHERE id = ?",
    )
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::not_found("Track", id));
    }

    Ok(())
}
