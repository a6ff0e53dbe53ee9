use crate::time::{from_millis, now_millis, to_millis};
use crate::tracks::{track_from_row, TRACK_COLUMNS};
use cadence_core::{
    error::Result,
    types::{
        CreatePlaylist, Playlist, PlaylistId, PlaylistItem, PlaylistKind, PlaylistStats,
        PlaylistTotals, SmartRule, SmartType, Track, TrackId,
    },
    CadenceError,
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

const PLAYLIST_COLUMNS: &str = r#"
    id, name, description, is_smart, smart_type, smart_criteria,
    auto_refresh, refresh_interval_hours, track_count, duration_ms,
    created_at, modified_at, last_refreshed_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, playlist_id, track_id, position, added_at,
    play_count, skip_count, bookmark_ms, last_played
"#;

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist> {
    let rule = if row.try_get::<i64, _>("is_smart")? != 0 {
        let smart_type: String = row.try_get("smart_type")?;
        let smart_type = SmartType::from_str(&smart_type).ok_or_else(|| {
            CadenceError::store(format!("Unknown smart playlist type: {}", smart_type))
        })?;
        Some(SmartRule {
            smart_type,
            criteria: row.try_get("smart_criteria")?,
        })
    } else {
        None
    };

    Ok(Playlist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        rule,
        auto_refresh: row.try_get::<i64, _>("auto_refresh")? != 0,
        refresh_interval_hours: row.try_get::<i64, _>("refresh_interval_hours")? as u32,
        track_count: row.try_get::<i64, _>("track_count")? as u32,
        duration_ms: row.try_get::<i64, _>("duration_ms")? as u64,
        created_at: from_millis(row.try_get("created_at")?),
        modified_at: from_millis(row.try_get("modified_at")?),
        last_refreshed_at: row.try_get::<Option<i64>, _>("last_refreshed_at")?.map(from_millis),
    })
}

fn item_from_row(row: &SqliteRow) -> Result<PlaylistItem> {
    Ok(PlaylistItem {
        id: row.try_get("id")?,
        playlist_id: row.try_get("playlist_id")?,
        track_id: row.try_get("track_id")?,
        position: row.try_get::<i64, _>("position")? as u32,
        added_at: from_millis(row.try_get("added_at")?),
        play_count: row.try_get::<i64, _>("play_count")? as u32,
        skip_count: row.try_get::<i64, _>("skip_count")? as u32,
        bookmark_ms: row.try_get::<i64, _>("bookmark_ms")? as u64,
        last_played: row.try_get::<Option<i64>, _>("last_played")?.map(from_millis),
    })
}

/// Get playlist by ID
pub async fn get_by_id(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!("SELECT {} FROM playlists WHERE id = ?", PLAYLIST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(playlist_from_row).transpose()
}

/// Get playlist by its unique name
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!("SELECT {} FROM playlists WHERE name = ?", PLAYLIST_COLUMNS))
        .bind(name)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(playlist_from_row).transpose()
}

/// List playlists, smart ones first, then by name
pub async fn list(pool: &SqlitePool, kind: PlaylistKind) -> Result<Vec<Playlist>> {
    let filter = match kind {
        PlaylistKind::All => "",
        PlaylistKind::Manual => "WHERE is_smart = 0",
        PlaylistKind::Smart => "WHERE is_smart = 1",
    };

    let rows = sqlx::query(&format!(
        "SELECT {} FROM playlists {} ORDER BY is_smart DESC, name ASC",
        PLAYLIST_COLUMNS, filter
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

/// Create new playlist
pub async fn create(pool: &SqlitePool, playlist: CreatePlaylist) -> Result<Playlist> {
    let name = playlist.name.trim();
    if name.is_empty() {
        return Err(CadenceError::invalid_argument("playlist name is empty"));
    }

    let now = now_millis();
    let (is_smart, smart_type, criteria) = match &playlist.rule {
        Some(rule) => (1_i64, Some(rule.smart_type.as_str()), rule.criteria.as_str()),
        None => (0_i64, None, ""),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO playlists (
            name, description, is_smart, smart_type, smart_criteria,
            auto_refresh, refresh_interval_hours, created_at, modified_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&playlist.description)
    .bind(is_smart)
    .bind(smart_type)
    .bind(criteria)
    .bind(i64::from(playlist.auto_refresh))
    .bind(i64::from(playlist.refresh_interval_hours))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CadenceError::invalid_argument(format!("playlist '{}' already exists", name))
        }
        other => other.into(),
    })?;

    let id = PlaylistId::new(result.last_insert_rowid());
    get_by_id(pool, id)
        .await?
        .ok_or_else(|| CadenceError::store("Failed to retrieve created playlist"))
}

/// Delete playlist (items cascade)
pub async fn delete(pool: &SqlitePool, id: PlaylistId) -> Result<()> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::not_found("Playlist", id));
    }

    Ok(())
}

/// Copy a playlist under a new name, membership and rule included
///
/// Per-slot counters start fresh on the copy.
pub async fn duplicate(pool: &SqlitePool, id: PlaylistId, new_name: &str) -> Result<Playlist> {
    let name = new_name.trim();
    if name.is_empty() {
        return Err(CadenceError::invalid_argument("playlist name is empty"));
    }

    let mut tx = pool.begin().await?;
    ensure_exists(&mut tx, id).await?;

    let now = now_millis();
    let result = sqlx::query(
        r#"
        INSERT INTO playlists (
            name, description, is_smart, smart_type, smart_criteria,
            auto_refresh, refresh_interval_hours, track_count, duration_ms,
            created_at, modified_at
        )
        SELECT ?, description, is_smart, smart_type, smart_criteria,
               auto_refresh, refresh_interval_hours, track_count, duration_ms,
               ?, ?
        FROM playlists
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CadenceError::invalid_argument(format!("playlist '{}' already exists", name))
        }
        other => other.into(),
    })?;
    let copy_id = PlaylistId::new(result.last_insert_rowid());

    sqlx::query(
        r#"
        INSERT INTO playlist_items (playlist_id, track_id, position, added_at)
        SELECT ?, track_id, position, ?
        FROM playlist_items
        WHERE playlist_id = ?
        ORDER BY position
        "#,
    )
    .bind(copy_id)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query(&format!("SELECT {} FROM playlists WHERE id = ?", PLAYLIST_COLUMNS))
        .bind(copy_id)
        .fetch_one(&mut *tx)
        .await?;
    let playlist = playlist_from_row(&row)?;

    tx.commit().await?;
    Ok(playlist)
}

/// Playlists whose name contains `query`, case-insensitively, by name
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Playlist>> {
    let pattern = format!("%{}%", escape_like(query.trim()));

    let rows = sqlx::query(&format!(
        "SELECT {} FROM playlists WHERE name LIKE ? ESCAPE '\\' ORDER BY name ASC",
        PLAYLIST_COLUMNS
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Playlists holding `track_id` at least once, by name
pub async fn containing_track(pool: &SqlitePool, track_id: TrackId) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM playlists
        WHERE id IN (SELECT playlist_id FROM playlist_items WHERE track_id = ?)
        ORDER BY name ASC
        "#,
        PLAYLIST_COLUMNS
    ))
    .bind(track_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

/// Whether `track_id` occupies any slot of the playlist
pub async fn contains_track(pool: &SqlitePool, id: PlaylistId, track_id: TrackId) -> Result<bool> {
    let mut conn = pool.acquire().await?;
    ensure_exists(&mut conn, id).await?;

    let row = sqlx::query(
        "SELECT 1 FROM playlist_items WHERE playlist_id = ? AND track_id = ? LIMIT 1",
    )
    .bind(id)
    .bind(track_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.is_some())
}

async fn ensure_exists(conn: &mut SqliteConnection, id: PlaylistId) -> Result<()> {
    let row = sqlx::query("SELECT 1 FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(_) => Ok(()),
        None => Err(CadenceError::not_found("Playlist", id)),
    }
}

async fn item_count(conn: &mut SqliteConnection, id: PlaylistId) -> Result<u32> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM playlist_items WHERE playlist_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.try_get::<i64, _>("n")? as u32)
}

/// Rewrite positions as `0..n`, keeping the current relative order
pub(crate) async fn renumber(conn: &mut SqliteConnection, id: PlaylistId) -> Result<()> {
    let item_ids: Vec<i64> = sqlx::query(
        "SELECT id FROM playlist_items WHERE playlist_id = ? ORDER BY position, id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(|row| row.try_get::<i64, _>("id"))
    .collect::<std::result::Result<_, sqlx::Error>>()?;

    for (position, item_id) in item_ids.into_iter().enumerate() {
        sqlx::query("UPDATE playlist_items SET position = ? WHERE id = ?")
            .bind(position as i64)
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Recompute and store the cached aggregates from current membership
pub(crate) async fn write_totals(conn: &mut SqliteConnection, id: PlaylistId) -> Result<PlaylistTotals> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS n, COALESCE(SUM(t.duration_ms), 0) AS total
        FROM playlist_items i
        INNER JOIN tracks t ON t.id = i.track_id
        WHERE i.playlist_id = ?
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    let totals = PlaylistTotals {
        track_count: row.try_get::<i64, _>("n")? as u32,
        duration_ms: row.try_get::<i64, _>("total")? as u64,
    };

    sqlx::query(
        "UPDATE playlists SET track_count = ?, duration_ms = ?, modified_at = ? WHERE id = ?",
    )
    .bind(i64::from(totals.track_count))
    .bind(totals.duration_ms as i64)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(totals)
}

/// Items in position order
pub async fn get_items(pool: &SqlitePool, id: PlaylistId) -> Result<Vec<PlaylistItem>> {
    let mut conn = pool.acquire().await?;
    ensure_exists(&mut conn, id).await?;

    let rows = sqlx::query(&format!(
        "SELECT {} FROM playlist_items WHERE playlist_id = ? ORDER BY position",
        ITEM_COLUMNS
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(item_from_row).collect()
}

/// Member tracks in position order
pub async fn get_tracks(pool: &SqlitePool, id: PlaylistId) -> Result<Vec<Track>> {
    let mut conn = pool.acquire().await?;
    ensure_exists(&mut conn, id).await?;

    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM playlist_items i
        INNER JOIN tracks ON tracks.id = i.track_id
        WHERE i.playlist_id = ?
        ORDER BY i.position
        "#,
        TRACK_COLUMNS
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(track_from_row).collect()
}

/// Replace all items in one transaction: delete, insert at `0..n`, aggregates
pub async fn replace_items(
    pool: &SqlitePool,
    id: PlaylistId,
    track_ids: &[TrackId],
) -> Result<PlaylistTotals> {
    let mut tx = pool.begin().await?;
    ensure_exists(&mut tx, id).await?;

    sqlx::query("DELETE FROM playlist_items WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let now = now_millis();
    for (position, track_id) in track_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO playlist_items (playlist_id, track_id, position, added_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(*track_id)
        .bind(position as i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    let totals = write_totals(&mut tx, id).await?;

    tx.commit().await?;
    Ok(totals)
}

/// Overwrite cached aggregates
pub async fn update_stats(
    pool: &SqlitePool,
    id: PlaylistId,
    track_count: u32,
    duration_ms: u64,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE playlists SET track_count = ?, duration_ms = ?, modified_at = ? WHERE id = ?",
    )
    .bind(i64::from(track_count))
    .bind(duration_ms as i64)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::not_found("Playlist", id));
    }

    Ok(())
}

/// Append a track at position `item_count`
pub async fn add_track(pool: &SqlitePool, id: PlaylistId, track_id: TrackId) -> Result<PlaylistItem> {
    let mut tx = pool.begin().await?;
    ensure_exists(&mut tx, id).await?;

    let position = item_count(&mut tx, id).await?;
    let result = sqlx::query(
        "INSERT INTO playlist_items (playlist_id, track_id, position, added_at) VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(track_id)
    .bind(i64::from(position))
    .bind(now_millis())
    .execute(&mut *tx)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            CadenceError::not_found("Track", track_id)
        }
        other => other.into(),
    })?;

    let row = sqlx::query(&format!("SELECT {} FROM playlist_items WHERE id = ?", ITEM_COLUMNS))
        .bind(result.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;
    let item = item_from_row(&row)?;

    write_totals(&mut tx, id).await?;

    tx.commit().await?;
    Ok(item)
}

/// Remove the slot at `position` and close the gap
pub async fn remove_at(pool: &SqlitePool, id: PlaylistId, position: u32) -> Result<()> {
    let mut tx = pool.begin().await?;
    ensure_exists(&mut tx, id).await?;

    let len = item_count(&mut tx, id).await?;
    if position >= len {
        return Err(CadenceError::OutOfRange {
            index: position as usize,
            len: len as usize,
        });
    }

    sqlx::query("DELETE FROM playlist_items WHERE playlist_id = ? AND position = ?")
        .bind(id)
        .bind(i64::from(position))
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        UPDATE playlist_items
        SET position = position - 1
        WHERE playlist_id = ?
          AND position > ?
        "#,
    )
    .bind(id)
    .bind(i64::from(position))
    .execute(&mut *tx)
    .await?;

    write_totals(&mut tx, id).await?;

    tx.commit().await?;
    Ok(())
}

/// Move the slot at `from` to `to`, shifting the contiguous range between
pub async fn move_item(pool: &SqlitePool, id: PlaylistId, from: u32, to: u32) -> Result<()> {
    let mut tx = pool.begin().await?;
    ensure_exists(&mut tx, id).await?;

    let len = item_count(&mut tx, id).await?;
    for index in [from, to] {
        if index >= len {
            return Err(CadenceError::OutOfRange {
                index: index as usize,
                len: len as usize,
            });
        }
    }

    if from == to {
        return Ok(());
    }

    let moved: i64 = sqlx::query("SELECT id FROM playlist_items WHERE playlist_id = ? AND position = ?")
        .bind(id)
        .bind(i64::from(from))
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

    if to < from {
        // Moving up: shift the range down
        sqlx::query(
            r#"
            UPDATE playlist_items
            SET position = position + 1
            WHERE playlist_id = ?
              AND position >= ?
              AND position < ?
            "#,
        )
        .bind(id)
        .bind(i64::from(to))
        .bind(i64::from(from))
        .execute(&mut *tx)
        .await?;
    } else {
        // Moving down: shift the range up
        sqlx::query(
            r#"
            UPDATE playlist_items
            SET position = position - 1
            WHERE playlist_id = ?
              AND position > ?
              AND position <= ?
            "#,
        )
        .bind(id)
        .bind(i64::from(from))
        .bind(i64::from(to))
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE playlist_items SET position = ? WHERE id = ?")
        .bind(i64::from(to))
        .bind(moved)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE playlists SET modified_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Computed statistics over current members
pub async fn stats(pool: &SqlitePool, id: PlaylistId) -> Result<PlaylistStats> {
    let mut conn = pool.acquire().await?;
    ensure_exists(&mut conn, id).await?;

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS n,
            COALESCE(SUM(t.duration_ms), 0) AS total,
            COALESCE(SUM(t.play_count), 0) AS plays,
            AVG(CASE WHEN t.rating > 0 THEN t.rating END) AS avg_rating
        FROM playlist_items i
        INNER JOIN tracks t ON t.id = i.track_id
        WHERE i.playlist_id = ?
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(PlaylistStats {
        track_count: row.try_get::<i64, _>("n")? as u32,
        duration_ms: row.try_get::<i64, _>("total")? as u64,
        play_count: row.try_get::<i64, _>("plays")? as u64,
        average_rating: row.try_get("avg_rating")?,
    })
}

/// Stamp the last smart refresh
pub async fn mark_refreshed(pool: &SqlitePool, id: PlaylistId, at: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query("UPDATE playlists SET last_refreshed_at = ? WHERE id = ?")
        .bind(to_millis(at))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::not_found("Playlist", id));
    }

    Ok(())
}

/// Per-slot counters
#[derive(Debug, Clone, Copy)]
enum ItemCounter {
    Played,
    Skipped,
}

impl ItemCounter {
    fn update_sql(self) -> &'static str {
        match self {
            Self::Played => {
                r#"
                UPDATE playlist_items
                SET play_count = play_count + 1, last_played = ?
                WHERE playlist_id = ? AND position = ?
                "#
            }
            Self::Skipped => {
                r#"
                UPDATE playlist_items
                SET skip_count = skip_count + 1
                WHERE playlist_id = ? AND position = ?
                "#
            }
        }
    }
}

async fn bump_item_counter(
    pool: &SqlitePool,
    id: PlaylistId,
    position: u32,
    counter: ItemCounter,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    ensure_exists(&mut tx, id).await?;

    let mut query = sqlx::query(counter.update_sql());
    if let ItemCounter::Played = counter {
        query = query.bind(now_millis());
    }
    let result = query
        .bind(id)
        .bind(i64::from(position))
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        let len = item_count(&mut tx, id).await?;
        return Err(CadenceError::OutOfRange {
            index: position as usize,
            len: len as usize,
        });
    }

    tx.commit().await?;
    Ok(())
}

/// Count a play of the slot at `position`
pub async fn record_item_played(pool: &SqlitePool, id: PlaylistId, position: u32) -> Result<()> {
    bump_item_counter(pool, id, position, ItemCounter::Played).await
}

/// Count a skip of the slot at `position`
pub async fn record_item_skipped(pool: &SqlitePool, id: PlaylistId, position: u32) -> Result<()> {
    bump_item_counter(pool, id, position, ItemCounter::Skipped).await
}
